//! Endpoint performance statistics.
//!
//! Every relay attempt, success or failure, is folded into the endpoint's
//! [`PerformanceRecord`] and persisted through the [`KvStore`] collaborator
//! with a rolling TTL. Reads never fail with not-found: an absent or
//! undecodable record comes back zero-valued, so the router tolerates cold
//! starts and store evictions.
//!
//! Concurrent requests may race on the read-modify-write; the store offers
//! no atomic increment and the last writer wins. The score only needs to be
//! directionally correct over many requests, so a lost update is tolerated.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use guardrpc_common::KvStore;
use tracing::warn;

const STATS_KEY_PREFIX: &str = "endpoint-stats:";

/// Current wall-clock time in unix epoch milliseconds.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Running per-endpoint statistics.
///
/// Invariant: `success_count + failure_count` is the total number of
/// attempts recorded since the record was created or last expired.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PerformanceRecord {
    pub success_count: u64,
    pub failure_count: u64,
    /// Running mean over every attempt. Attempts that never produced a
    /// response contribute 0ms (see DESIGN.md).
    pub avg_latency_ms: f64,
    /// Unix epoch ms of the most recent attempt.
    pub last_used_at: u64,
}

impl PerformanceRecord {
    pub fn total_attempts(&self) -> u64 {
        self.success_count + self.failure_count
    }

    /// Fold one attempt into the record.
    pub fn record_attempt(&mut self, succeeded: bool, latency_ms: f64, now_ms: u64) {
        if succeeded {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        let total = self.total_attempts() as f64;
        self.avg_latency_ms += (latency_ms - self.avg_latency_ms) / total;
        self.last_used_at = now_ms;
    }
}

/// Stats store over the injected [`KvStore`].
#[derive(Clone)]
pub struct StatsStore {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
}

impl StatsStore {
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    fn key(endpoint: &str) -> String {
        format!("{STATS_KEY_PREFIX}{endpoint}")
    }

    /// Fetch the record for `endpoint`, zero-valued when absent.
    pub async fn get(&self, endpoint: &str) -> PerformanceRecord {
        match self.kv.get(&Self::key(endpoint)).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(endpoint, error = %e, "discarding undecodable performance record");
                PerformanceRecord::default()
            }),
            Ok(None) => PerformanceRecord::default(),
            Err(e) => {
                warn!(endpoint, error = %e, "stats read failed, using empty record");
                PerformanceRecord::default()
            }
        }
    }

    /// Persist `record`, refreshing its rolling expiration.
    pub async fn put(&self, endpoint: &str, record: &PerformanceRecord) {
        let value = match serde_json::to_value(record) {
            Ok(value) => value,
            Err(e) => {
                warn!(endpoint, error = %e, "failed to encode performance record");
                return;
            }
        };
        if let Err(e) = self.kv.put(&Self::key(endpoint), value, self.ttl).await {
            warn!(endpoint, error = %e, "stats write failed");
        }
    }

    /// Read-modify-write one attempt outcome. Returns the updated record.
    pub async fn record_attempt(
        &self,
        endpoint: &str,
        succeeded: bool,
        latency_ms: f64,
    ) -> PerformanceRecord {
        let mut record = self.get(endpoint).await;
        record.record_attempt(succeeded, latency_ms, unix_millis());
        self.put(endpoint, &record).await;
        record
    }
}
