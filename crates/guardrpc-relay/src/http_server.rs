//! HTTP surface.
//!
//! Axum server exposing the JSON-RPC entry points:
//!
//! - `POST /rpc` - single or batch JSON-RPC body against the default network
//! - `POST /rpc/{network}` - same against a named network
//! - `GET /status/{id}` - stored submission metadata or 404
//! - `GET /` - liveness probe
//!
//! CORS preflights are answered permissively by the tower-http layer, so
//! browser wallets can talk to the proxy directly.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use guardrpc_common::protocol::{RpcError, RpcPayload, RpcReply, RpcResponse};
use guardrpc_common::{GuardError, Result};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::router::RpcRouter;

/// HTTP server wrapping an [`RpcRouter`].
pub struct HttpServer {
    router: Arc<RpcRouter>,
}

impl HttpServer {
    pub fn new(router: Arc<RpcRouter>) -> Self {
        Self { router }
    }

    /// The axum application, exposed separately so tests can drive it.
    pub fn app(&self) -> axum::Router {
        axum::Router::new()
            .route("/", get(liveness))
            .route("/rpc", post(handle_rpc))
            .route("/rpc/{network}", post(handle_rpc_network))
            .route("/status/{id}", get(handle_status))
            .layer(CorsLayer::permissive())
            .with_state(self.router.clone())
    }

    /// Bind `addr` and serve until shutdown.
    pub async fn run(self, addr: SocketAddr) -> Result<()> {
        let app = self.app();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GuardError::Transport(format!("failed to bind {addr}: {e}")))?;
        let local = listener
            .local_addr()
            .map_err(|e| GuardError::Transport(format!("failed to get local addr: {e}")))?;
        info!("guardrpc listening on {local}");

        axum::serve(listener, app)
            .await
            .map_err(|e| GuardError::Transport(format!("server error: {e}")))
    }
}

async fn handle_rpc(State(router): State<Arc<RpcRouter>>, body: Bytes) -> Json<RpcReply> {
    Json(process_body(&router, None, &body).await)
}

async fn handle_rpc_network(
    State(router): State<Arc<RpcRouter>>,
    Path(network): Path<String>,
    body: Bytes,
) -> Json<RpcReply> {
    Json(process_body(&router, Some(&network), &body).await)
}

async fn process_body(router: &RpcRouter, network: Option<&str>, body: &[u8]) -> RpcReply {
    match serde_json::from_slice::<RpcPayload>(body) {
        Ok(payload) => router.handle_payload(payload, network).await,
        // Body was not JSON-RPC shaped at all; there is no id to echo.
        Err(_) => RpcReply::Single(RpcResponse::error(Value::Null, RpcError::parse_error())),
    }
}

async fn handle_status(
    State(router): State<Arc<RpcRouter>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match router.submission_status(&id).await {
        Some(record) => (StatusCode::OK, Json(record)),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))),
    }
}

async fn liveness() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}
