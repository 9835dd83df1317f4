//! Candidate ranking.
//!
//! Orders the configured relay list by descending score. The sort is
//! stable, so endpoints with equal scores keep their configured order and
//! identical inputs always produce identical output.

use std::collections::HashMap;

use crate::config::{RelayEndpoint, ScoreWeights};
use crate::score::score;
use crate::stats::PerformanceRecord;

/// Rank `candidates` by descending score at `now_ms`.
///
/// Endpoints missing from `stats` are scored as untried. The result is a
/// permutation of the input.
pub fn rank(
    candidates: &[RelayEndpoint],
    stats: &HashMap<String, PerformanceRecord>,
    now_ms: u64,
    weights: &ScoreWeights,
) -> Vec<RelayEndpoint> {
    let untried = PerformanceRecord::default();
    let mut scored: Vec<(f64, &RelayEndpoint)> = candidates
        .iter()
        .map(|candidate| {
            let record = stats.get(&candidate.id).unwrap_or(&untried);
            (score(record, now_ms, weights), candidate)
        })
        .collect();

    // Stable sort keeps configured order on ties.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().map(|(_, candidate)| candidate.clone()).collect()
}
