//! Router configuration.
//!
//! Everything the router needs is carried in an explicit [`RouterConfig`]
//! passed at construction; nothing is read from ambient process state.

use std::collections::HashSet;
use std::time::Duration;

/// Per-attempt timeout for relay submissions.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(3_500);
/// Timeout for read-class forwarding to an upstream.
pub const DEFAULT_FORWARD_TIMEOUT: Duration = Duration::from_secs(8);
/// Rolling expiration of endpoint performance records.
pub const DEFAULT_STATS_TTL: Duration = Duration::from_secs(7 * 24 * 3600);
/// Expiration of submission status records.
pub const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(24 * 3600);

/// One relay endpoint a write submission may be delivered to.
///
/// The id is stable for the process lifetime; the set is configured, not
/// discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayEndpoint {
    pub id: String,
    pub url: String,
}

impl RelayEndpoint {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Weights of the endpoint scoring terms.
///
/// `untried_score` is the score assigned to endpoints with no recorded
/// attempts. The default of `0.0` sorts untried endpoints last; raising it
/// is the opt-in exploration policy for seeding traffic to new relays.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreWeights {
    pub success_rate: f64,
    pub response: f64,
    pub recency: f64,
    pub untried_score: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            success_rate: 0.6,
            response: 0.3,
            recency: 0.1,
            untried_score: 0.0,
        }
    }
}

/// Full router configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Candidate relay endpoints for write-class calls, in configured order.
    /// The configured order is the tie-break order when scores are equal.
    pub relays: Vec<RelayEndpoint>,
    /// Methods routed through the relay cascade instead of forwarded.
    pub write_methods: HashSet<String>,
    /// Hard timeout per relay attempt.
    pub attempt_timeout: Duration,
    /// Timeout for read-class upstream forwarding.
    pub forward_timeout: Duration,
    /// Rolling TTL for performance records.
    pub stats_ttl: Duration,
    /// TTL for submission status records.
    pub status_ttl: Duration,
    /// Scoring weights.
    pub weights: ScoreWeights,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            relays: Vec::new(),
            write_methods: ["eth_sendRawTransaction".to_string()].into_iter().collect(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            forward_timeout: DEFAULT_FORWARD_TIMEOUT,
            stats_ttl: DEFAULT_STATS_TTL,
            status_ttl: DEFAULT_STATUS_TTL,
            weights: ScoreWeights::default(),
        }
    }
}

impl RouterConfig {
    /// Whether `method` belongs to the write class.
    pub fn is_write_method(&self, method: &str) -> bool {
        self.write_methods.contains(method)
    }
}
