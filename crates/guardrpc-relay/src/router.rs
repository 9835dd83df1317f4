//! Request routing.
//!
//! The router is the entry point behind the HTTP surface. Write-class
//! calls are validated and handed to the relay cascade; everything else is
//! forwarded unmodified to the resolved network's upstream. Either way the
//! caller gets a well-formed JSON-RPC envelope with its own id echoed
//! back; no failure propagates past this boundary.
//!
//! Per request: Received → Validated → {Cascading | Forwarding} →
//! Completed | Failed.

use std::sync::Arc;

use futures::future::join_all;
use guardrpc_common::protocol::{RpcError, RpcPayload, RpcReply, RpcRequest, RpcResponse};
use guardrpc_common::{GuardError, KvStore, Result};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::RouterConfig;
use crate::dispatcher::{CascadeResult, Dispatcher};
use crate::networks::NetworkRegistry;
use crate::stats::unix_millis;
use crate::transport::RelayTransport;

const SUBMISSION_KEY_PREFIX: &str = "submission:";

/// JSON-RPC router over the relay cascade and per-network upstreams.
pub struct RpcRouter {
    config: RouterConfig,
    networks: NetworkRegistry,
    dispatcher: Dispatcher,
    transport: Arc<dyn RelayTransport>,
    kv: Arc<dyn KvStore>,
}

impl RpcRouter {
    pub fn new(
        config: RouterConfig,
        networks: NetworkRegistry,
        dispatcher: Dispatcher,
        transport: Arc<dyn RelayTransport>,
        kv: Arc<dyn KvStore>,
    ) -> Self {
        Self {
            config,
            networks,
            dispatcher,
            transport,
            kv,
        }
    }

    /// Handle a request body: one call, or a batch fanned out concurrently.
    ///
    /// Batch results are collected positionally, so a caller sending N
    /// calls receives N responses in the same order whatever the
    /// completion interleaving was.
    pub async fn handle_payload(&self, payload: RpcPayload, network: Option<&str>) -> RpcReply {
        match payload {
            RpcPayload::Single(request) => RpcReply::Single(self.handle_call(request, network).await),
            RpcPayload::Batch(calls) => {
                let responses =
                    join_all(calls.into_iter().map(|call| self.handle_call(call, network))).await;
                RpcReply::Batch(responses)
            }
        }
    }

    /// Handle one call. Always yields an envelope echoing the caller's id.
    pub async fn handle_call(&self, request: RpcRequest, network: Option<&str>) -> RpcResponse {
        let id = request.id.clone();
        match self.try_handle(request, network).await {
            Ok(response) => response,
            Err(GuardError::UnknownNetwork(name)) => RpcResponse::error(
                id,
                RpcError::invalid_params(format!("unknown network: {name}")),
            ),
            Err(GuardError::Validation(msg)) => RpcResponse::error(id, RpcError::invalid_params(msg)),
            Err(e) => RpcResponse::error(id, RpcError::internal_error(e.to_string())),
        }
    }

    async fn try_handle(&self, request: RpcRequest, network: Option<&str>) -> Result<RpcResponse> {
        let (network_name, network) = self.networks.resolve(network)?;

        if self.config.is_write_method(&request.method) {
            if !network.relay_protected {
                // Writes are only accepted where the relay set applies.
                return Ok(RpcResponse::error(
                    request.id.clone(),
                    RpcError::server_error(format!(
                        "{} is not supported on network {network_name}",
                        request.method
                    )),
                ));
            }
            validate_raw_tx_params(&request.params)?;
            Ok(self.handle_write(request).await)
        } else {
            self.forward_read(request, &network.upstream_url).await
        }
    }

    /// Run the relay cascade for a validated write call.
    async fn handle_write(&self, request: RpcRequest) -> RpcResponse {
        let id = request.id.clone();
        let result = self
            .dispatcher
            .dispatch(&request, &self.config.relays, self.config.attempt_timeout)
            .await;

        match result {
            CascadeResult::Delivered(outcome) => {
                let result = outcome.result.clone().unwrap_or(Value::Null);
                self.persist_submission(&outcome.endpoint, outcome.latency_ms, &result)
                    .await;
                info!(endpoint = %outcome.endpoint, "write delivered");
                RpcResponse::success(id, result)
            }
            CascadeResult::Exhausted { attempts } => {
                warn!(attempts, "relay cascade exhausted");
                RpcResponse::error(id, RpcError::server_error("All relays failed"))
            }
        }
    }

    /// Forward a read-class call to the network upstream.
    ///
    /// The upstream response passes through unmodified except for the id,
    /// which is re-stamped so the caller can correlate the reply even if
    /// the upstream ignored or mangled it.
    async fn forward_read(&self, request: RpcRequest, upstream_url: &str) -> Result<RpcResponse> {
        let body = serde_json::to_value(&request)?;
        let value = self
            .transport
            .post_json(upstream_url, &body, self.config.forward_timeout)
            .await?;
        let mut response: RpcResponse = serde_json::from_value(value)
            .map_err(|e| GuardError::InvalidResponse(format!("malformed upstream response: {e}")))?;
        response.id = request.id;
        Ok(response)
    }

    /// Look up the stored metadata of a past submission.
    pub async fn submission_status(&self, id: &str) -> Option<Value> {
        match self.kv.get(&format!("{SUBMISSION_KEY_PREFIX}{id}")).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "submission status read failed");
                None
            }
        }
    }

    async fn persist_submission(&self, endpoint: &str, latency_ms: f64, result: &Value) {
        // Submissions are keyed by the relay-reported hash; a non-string
        // result has nothing to key on.
        let Some(hash) = result.as_str() else {
            return;
        };
        let record = json!({
            "endpoint": endpoint,
            "latency_ms": latency_ms,
            "submitted_at": unix_millis(),
        });
        let key = format!("{SUBMISSION_KEY_PREFIX}{hash}");
        if let Err(e) = self.kv.put(&key, record, self.config.status_ttl).await {
            warn!(error = %e, "failed to persist submission record");
        } else {
            debug!(hash, "persisted submission record");
        }
    }
}

/// Validate the parameter shape of the write operation: a non-empty array
/// whose first element is a 0x-prefixed, even-length hex string.
fn validate_raw_tx_params(params: &Value) -> Result<()> {
    let first = params
        .as_array()
        .and_then(|a| a.first())
        .ok_or_else(|| GuardError::Validation("expected a one-element params array".into()))?;
    let hex = first
        .as_str()
        .ok_or_else(|| GuardError::Validation("transaction must be a hex string".into()))?;
    let digits = hex
        .strip_prefix("0x")
        .ok_or_else(|| GuardError::Validation("transaction hex must start with 0x".into()))?;
    if digits.is_empty()
        || digits.len() % 2 != 0
        || !digits.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(GuardError::Validation(
            "transaction is not a hex-encoded byte string".into(),
        ));
    }
    Ok(())
}
