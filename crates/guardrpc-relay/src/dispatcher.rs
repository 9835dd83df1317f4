//! Ranked relay cascade.
//!
//! The dispatcher takes a write-class request plus the configured candidate
//! list, ranks the candidates by their persisted statistics, and tries them
//! strictly in order under a hard per-attempt timeout. The first accepted
//! submission wins and ends the cascade; exhausting every candidate yields
//! a terminal failure.
//!
//! Every attempt, success or failure, is recorded into the stats store
//! before the next candidate is tried, so the ordering of side effects is
//! deterministic. Latency is recorded only when a response was actually
//! received; a timed-out or connection-failed attempt records 0ms.
//!
//! Attempts are sequential on purpose: racing all relays at once would
//! defeat the ranking and accept the same submission in more than one
//! place far more often. Even so, delivery is not exactly-once: a slow
//! success that loses against the attempt timeout is classified as a
//! failure here while the relay may still accept it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use guardrpc_common::protocol::RpcResponse;
use guardrpc_common::{GuardError, RpcRequest};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{RelayEndpoint, ScoreWeights};
use crate::ranker::rank;
use crate::stats::{unix_millis, StatsStore};
use crate::transport::RelayTransport;

/// Result of one candidate attempt. Transient; only its success flag and
/// latency are folded into the endpoint's performance record.
#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    pub endpoint: String,
    pub succeeded: bool,
    pub latency_ms: f64,
    /// Relay-reported result payload (present on success).
    pub result: Option<Value>,
    /// Short failure detail (present on failure).
    pub error: Option<String>,
}

/// Result of a full ranked cascade.
#[derive(Debug, Clone)]
pub enum CascadeResult {
    /// The first successful attempt; later candidates were never tried.
    Delivered(AttemptOutcome),
    /// Every candidate failed.
    Exhausted { attempts: usize },
}

/// Executes ranked cascades against the relay set.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn RelayTransport>,
    stats: StatsStore,
    weights: ScoreWeights,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn RelayTransport>, stats: StatsStore, weights: ScoreWeights) -> Self {
        Self {
            transport,
            stats,
            weights,
        }
    }

    /// Deliver `request` to the first accepting candidate.
    ///
    /// Candidates are ranked by score, then tried sequentially with
    /// `attempt_timeout` each. Each attempt's outcome is written to the
    /// stats store before the next candidate is contacted.
    pub async fn dispatch(
        &self,
        request: &RpcRequest,
        candidates: &[RelayEndpoint],
        attempt_timeout: Duration,
    ) -> CascadeResult {
        let mut stats = HashMap::with_capacity(candidates.len());
        for candidate in candidates {
            stats.insert(candidate.id.clone(), self.stats.get(&candidate.id).await);
        }
        let ranked = rank(candidates, &stats, unix_millis(), &self.weights);
        debug!(
            order = ?ranked.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            "ranked relay candidates"
        );

        let mut attempts = 0;
        for relay in &ranked {
            attempts += 1;
            let outcome = self.attempt(relay, request, attempt_timeout).await;
            self.stats
                .record_attempt(&relay.id, outcome.succeeded, outcome.latency_ms)
                .await;

            if outcome.succeeded {
                debug!(
                    endpoint = %outcome.endpoint,
                    latency_ms = outcome.latency_ms,
                    "submission accepted"
                );
                return CascadeResult::Delivered(outcome);
            }
            warn!(
                endpoint = %outcome.endpoint,
                error = outcome.error.as_deref().unwrap_or("unknown"),
                "relay attempt failed, advancing to next candidate"
            );
        }

        CascadeResult::Exhausted { attempts }
    }

    /// One timeout-bounded attempt against one relay.
    async fn attempt(
        &self,
        relay: &RelayEndpoint,
        request: &RpcRequest,
        timeout: Duration,
    ) -> AttemptOutcome {
        let body = match serde_json::to_value(request) {
            Ok(body) => body,
            Err(e) => {
                return AttemptOutcome {
                    endpoint: relay.id.clone(),
                    succeeded: false,
                    latency_ms: 0.0,
                    result: None,
                    error: Some(format!("unserializable request: {e}")),
                }
            }
        };

        let started = Instant::now();
        match self.transport.post_json(&relay.url, &body, timeout).await {
            Ok(value) => {
                // A response arrived, so its latency counts even when the
                // relay rejected the submission.
                let latency_ms = started.elapsed().as_secs_f64() * 1_000.0;
                match serde_json::from_value::<RpcResponse>(value) {
                    Ok(response) if response.is_success() => AttemptOutcome {
                        endpoint: relay.id.clone(),
                        succeeded: true,
                        latency_ms,
                        result: response.result,
                        error: None,
                    },
                    Ok(response) => AttemptOutcome {
                        endpoint: relay.id.clone(),
                        succeeded: false,
                        latency_ms,
                        result: None,
                        error: Some(
                            response
                                .error
                                .map(|e| e.message)
                                .unwrap_or_else(|| "empty result".to_string()),
                        ),
                    },
                    Err(e) => AttemptOutcome {
                        endpoint: relay.id.clone(),
                        succeeded: false,
                        latency_ms,
                        result: None,
                        error: Some(format!("malformed relay response: {e}")),
                    },
                }
            }
            // No response was received; latency stays 0 rather than the
            // elapsed wall-clock (see DESIGN.md).
            Err(e @ (GuardError::Timeout(_) | GuardError::Transport(_))) => AttemptOutcome {
                endpoint: relay.id.clone(),
                succeeded: false,
                latency_ms: 0.0,
                result: None,
                error: Some(e.to_string()),
            },
            Err(e) => AttemptOutcome {
                endpoint: relay.id.clone(),
                succeeded: false,
                latency_ms: started.elapsed().as_secs_f64() * 1_000.0,
                result: None,
                error: Some(e.to_string()),
            },
        }
    }
}
