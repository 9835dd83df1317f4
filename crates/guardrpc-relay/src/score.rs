//! Endpoint scoring.
//!
//! A pure function from a [`PerformanceRecord`] to a rank in `[0, 1]`,
//! combining three weighted signals:
//!
//! | Signal         | Range  | Meaning                                      |
//! |----------------|--------|----------------------------------------------|
//! | success rate   | 0..=1  | fraction of attempts that succeeded          |
//! | response score | 0..=1  | linear latency penalty, floor at 5s          |
//! | recency score  | 0..=1  | decays to 0 over 24h of inactivity           |
//!
//! Endpoints with no recorded attempts score the configured
//! `untried_score` (0 by default), so brand-new or evicted endpoints sort
//! last rather than first.

use crate::config::ScoreWeights;
use crate::stats::PerformanceRecord;

/// Latency at or beyond which the response score bottoms out at 0.
pub const LATENCY_CEILING_MS: f64 = 5_000.0;
/// Idle window over which the recency score decays to 0.
pub const RECENCY_WINDOW_MS: f64 = 86_400_000.0;

/// Score `record` at wall-clock `now_ms`.
pub fn score(record: &PerformanceRecord, now_ms: u64, weights: &ScoreWeights) -> f64 {
    let total = record.total_attempts();
    if total == 0 {
        return weights.untried_score;
    }

    let success_rate = record.success_count as f64 / total as f64;
    let response_score = (1.0 - record.avg_latency_ms / LATENCY_CEILING_MS).max(0.0);
    let idle_ms = now_ms.saturating_sub(record.last_used_at) as f64;
    let recency_score = (1.0 - idle_ms / RECENCY_WINDOW_MS).max(0.0);

    weights.success_rate * success_rate
        + weights.response * response_score
        + weights.recency * recency_score
}
