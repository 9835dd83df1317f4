//! Guardrpc Relay Core
//!
//! Adaptive multi-endpoint submission routing: write-class JSON-RPC calls
//! are delivered through a ranked, early-exit cascade of relay endpoints,
//! ordered by each endpoint's persisted success rate, latency, and
//! recency. Read-class calls bypass the cascade and are forwarded to a
//! single per-network upstream.
//!
//! # Components
//!
//! - [`stats`] - per-endpoint performance records over the KV collaborator
//! - [`score`] / [`ranker`] - pure scoring and deterministic ordering
//! - [`dispatcher`] - the sequential, timeout-bounded relay cascade
//! - [`router`] - validation, cascade/forward split, batch fan-out
//! - [`http_server`] - the axum surface with permissive CORS

pub mod config;
pub mod dispatcher;
pub mod http_server;
pub mod networks;
pub mod ranker;
pub mod router;
pub mod score;
pub mod stats;
pub mod transport;

pub use config::{RelayEndpoint, RouterConfig, ScoreWeights};
pub use dispatcher::{AttemptOutcome, CascadeResult, Dispatcher};
pub use http_server::HttpServer;
pub use networks::{Network, NetworkRegistry};
pub use router::RpcRouter;
pub use stats::{PerformanceRecord, StatsStore};
pub use transport::{HttpTransport, RelayTransport};
