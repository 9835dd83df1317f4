//! Outbound HTTP transport.
//!
//! Relay submissions and read-class forwarding both go through the narrow
//! [`RelayTransport`] interface: POST a JSON body, get the parsed JSON
//! response back, bounded by a hard timeout. Expiry abandons the in-flight
//! call; there is no retry at this layer.

use std::time::Duration;

use async_trait::async_trait;
use guardrpc_common::{GuardError, Result};
use serde_json::Value;

/// Outbound JSON-over-HTTP call with a hard per-call timeout.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<Value>;
}

/// [`RelayTransport`] backed by a shared reqwest client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelayTransport for HttpTransport {
    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GuardError::Timeout(timeout.as_millis() as u64)
                } else {
                    GuardError::Transport(format!("request to {url} failed: {e}"))
                }
            })?;

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                GuardError::Timeout(timeout.as_millis() as u64)
            } else {
                GuardError::Transport(format!("failed to read response from {url}: {e}"))
            }
        })?;

        serde_json::from_slice(&bytes)
            .map_err(|e| GuardError::InvalidResponse(format!("non-JSON response from {url}: {e}")))
    }
}
