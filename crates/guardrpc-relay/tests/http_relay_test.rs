//! HTTP Relay Integration Tests
//!
//! Drives the full HTTP surface against mock relay and upstream servers,
//! verifying the cascade, read forwarding, batch handling, and the status
//! endpoint end to end.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use guardrpc_common::protocol::{RpcError, RpcRequest, RpcResponse};
use guardrpc_common::{KvStore, MemoryKvStore};
use guardrpc_relay::{
    Dispatcher, HttpServer, HttpTransport, Network, NetworkRegistry, RelayEndpoint, RelayTransport,
    RouterConfig, RpcRouter, StatsStore,
};
use serde_json::{json, Value};

// ============================================================================
// Mock JSON-RPC Server
// ============================================================================

/// How a mock server answers submissions.
#[derive(Clone, Copy)]
enum Behavior {
    /// Accept with a fixed result payload.
    Accept(&'static str),
    /// Answer with a JSON-RPC error.
    Reject,
    /// Return a 200 body that is not JSON.
    Garbage,
}

/// A mock relay/upstream answering HTTP JSON-RPC on an ephemeral port.
struct MockRpcServer {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    _handle: tokio::task::JoinHandle<()>,
}

#[derive(Clone)]
struct MockState {
    behavior: Behavior,
    hits: Arc<AtomicUsize>,
}

impl MockRpcServer {
    async fn start(behavior: Behavior) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = MockState {
            behavior,
            hits: hits.clone(),
        };

        async fn handle(State(state): State<MockState>, body: Bytes) -> Vec<u8> {
            state.hits.fetch_add(1, Ordering::SeqCst);
            let id = serde_json::from_slice::<RpcRequest>(&body)
                .map(|r| r.id)
                .unwrap_or(Value::Null);
            match state.behavior {
                Behavior::Accept(result) => {
                    let response = RpcResponse::success(id, json!(result));
                    serde_json::to_vec(&response).unwrap()
                }
                Behavior::Reject => {
                    let response =
                        RpcResponse::error(id, RpcError::server_error("submission rejected"));
                    serde_json::to_vec(&response).unwrap()
                }
                Behavior::Garbage => b"<html>gateway error</html>".to_vec(),
            }
        }

        let app = axum::Router::new()
            .route("/", post(handle))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            hits,
            _handle: handle,
        }
    }

    fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Fixture
// ============================================================================

struct Fixture {
    base_url: String,
    stats: StatsStore,
    client: reqwest::Client,
    _handle: tokio::task::JoinHandle<()>,
}

/// Boot a guardrpc server wired to the given relay mocks and upstream.
async fn start_proxy(relays: Vec<(&str, &MockRpcServer)>, upstream: &MockRpcServer) -> Fixture {
    let kv = Arc::new(MemoryKvStore::new());
    let config = RouterConfig {
        relays: relays
            .iter()
            .map(|(id, server)| RelayEndpoint::new(*id, server.url()))
            .collect(),
        ..Default::default()
    };
    let networks = NetworkRegistry::new(
        "mainnet",
        HashMap::from([
            ("mainnet".to_string(), Network::new(upstream.url(), true)),
            ("sepolia".to_string(), Network::new(upstream.url(), false)),
        ]),
    )
    .unwrap();

    let transport = Arc::new(HttpTransport::new()) as Arc<dyn RelayTransport>;
    let stats = StatsStore::new(kv.clone() as Arc<dyn KvStore>, config.stats_ttl);
    let dispatcher = Dispatcher::new(transport.clone(), stats.clone(), config.weights.clone());
    let router = Arc::new(RpcRouter::new(
        config,
        networks,
        dispatcher,
        transport,
        kv as Arc<dyn KvStore>,
    ));

    let app = HttpServer::new(router).app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Fixture {
        base_url: format!("http://{addr}"),
        stats,
        client: reqwest::Client::new(),
        _handle: handle,
    }
}

fn write_body(tx: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "eth_sendRawTransaction",
        "params": [tx],
        "id": 1
    })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_write_delivered_to_single_relay() {
    let relay = MockRpcServer::start(Behavior::Accept("0xhash01")).await;
    let upstream = MockRpcServer::start(Behavior::Accept("0x10")).await;
    let proxy = start_proxy(vec![("flashbots", &relay)], &upstream).await;

    let response: Value = proxy
        .client
        .post(format!("{}/rpc", proxy.base_url))
        .json(&write_body("0x02f870"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response["result"], json!("0xhash01"));
    assert_eq!(response["id"], json!(1));
    assert_eq!(relay.hits(), 1);
    assert_eq!(upstream.hits(), 0);
    assert_eq!(proxy.stats.get("flashbots").await.success_count, 1);
}

#[tokio::test]
async fn test_cascade_fails_over_and_skips_rest() {
    let bad = MockRpcServer::start(Behavior::Reject).await;
    let good = MockRpcServer::start(Behavior::Accept("0xhash02")).await;
    let spare = MockRpcServer::start(Behavior::Accept("0xother")).await;
    let upstream = MockRpcServer::start(Behavior::Accept("0x10")).await;
    let proxy = start_proxy(
        vec![("bad", &bad), ("good", &good), ("spare", &spare)],
        &upstream,
    )
    .await;

    let response: Value = proxy
        .client
        .post(format!("{}/rpc", proxy.base_url))
        .json(&write_body("0x02f870"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response["result"], json!("0xhash02"));
    assert_eq!(bad.hits(), 1);
    assert_eq!(good.hits(), 1);
    // Early exit: the third candidate was never attempted.
    assert_eq!(spare.hits(), 0);
    assert_eq!(proxy.stats.get("bad").await.failure_count, 1);
    assert_eq!(proxy.stats.get("good").await.success_count, 1);
    assert_eq!(proxy.stats.get("spare").await.total_attempts(), 0);
}

#[tokio::test]
async fn test_all_relays_failing_yields_server_error() {
    let a = MockRpcServer::start(Behavior::Reject).await;
    let b = MockRpcServer::start(Behavior::Garbage).await;
    let upstream = MockRpcServer::start(Behavior::Accept("0x10")).await;
    let proxy = start_proxy(vec![("a", &a), ("b", &b)], &upstream).await;

    let response: Value = proxy
        .client
        .post(format!("{}/rpc", proxy.base_url))
        .json(&write_body("0x02f870"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response["error"]["code"], json!(-32000));
    assert_eq!(response["error"]["message"], json!("All relays failed"));
    assert_eq!(a.hits(), 1);
    assert_eq!(b.hits(), 1);
    assert_eq!(proxy.stats.get("a").await.failure_count, 1);
    assert_eq!(proxy.stats.get("b").await.failure_count, 1);
}

#[tokio::test]
async fn test_invalid_hex_rejected_without_relay_contact() {
    let relay = MockRpcServer::start(Behavior::Accept("0xhash03")).await;
    let upstream = MockRpcServer::start(Behavior::Accept("0x10")).await;
    let proxy = start_proxy(vec![("flashbots", &relay)], &upstream).await;

    let response: Value = proxy
        .client
        .post(format!("{}/rpc", proxy.base_url))
        .json(&write_body("not-hex"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response["error"]["code"], json!(-32602));
    assert_eq!(relay.hits(), 0);
    assert_eq!(proxy.stats.get("flashbots").await.total_attempts(), 0);
}

#[tokio::test]
async fn test_read_is_forwarded_to_upstream() {
    let relay = MockRpcServer::start(Behavior::Accept("0xhash04")).await;
    let upstream = MockRpcServer::start(Behavior::Accept("0x4af2c")).await;
    let proxy = start_proxy(vec![("flashbots", &relay)], &upstream).await;

    let response: Value = proxy
        .client
        .post(format!("{}/rpc", proxy.base_url))
        .json(&json!({"jsonrpc": "2.0", "method": "eth_blockNumber", "params": [], "id": "q"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response["result"], json!("0x4af2c"));
    assert_eq!(response["id"], json!("q"));
    assert_eq!(upstream.hits(), 1);
    assert_eq!(relay.hits(), 0);
}

#[tokio::test]
async fn test_unknown_network_rejected_without_upstream_contact() {
    let relay = MockRpcServer::start(Behavior::Accept("0xhash05")).await;
    let upstream = MockRpcServer::start(Behavior::Accept("0x10")).await;
    let proxy = start_proxy(vec![("flashbots", &relay)], &upstream).await;

    let response: Value = proxy
        .client
        .post(format!("{}/rpc/goerli", proxy.base_url))
        .json(&json!({"jsonrpc": "2.0", "method": "eth_blockNumber", "params": [], "id": 5}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response["error"]["code"], json!(-32602));
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn test_write_on_unprotected_network_rejected() {
    let relay = MockRpcServer::start(Behavior::Accept("0xhash06")).await;
    let upstream = MockRpcServer::start(Behavior::Accept("0x10")).await;
    let proxy = start_proxy(vec![("flashbots", &relay)], &upstream).await;

    let response: Value = proxy
        .client
        .post(format!("{}/rpc/sepolia", proxy.base_url))
        .json(&write_body("0x02f870"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response["error"]["code"], json!(-32000));
    assert_eq!(relay.hits(), 0);
}

#[tokio::test]
async fn test_batch_round_trips_in_order() {
    let relay = MockRpcServer::start(Behavior::Accept("0xhash07")).await;
    let upstream = MockRpcServer::start(Behavior::Accept("0xbeef")).await;
    let proxy = start_proxy(vec![("flashbots", &relay)], &upstream).await;

    let body = json!([
        {"jsonrpc": "2.0", "method": "eth_blockNumber", "params": [], "id": 1},
        {"jsonrpc": "2.0", "method": "eth_sendRawTransaction", "params": ["0x02f870"], "id": 2},
        {"jsonrpc": "2.0", "method": "eth_chainId", "params": [], "id": 3}
    ]);
    let response: Value = proxy
        .client
        .post(format!("{}/rpc", proxy.base_url))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let responses = response.as_array().unwrap();
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["id"], json!(1));
    assert_eq!(responses[1]["id"], json!(2));
    assert_eq!(responses[2]["id"], json!(3));
    assert_eq!(responses[1]["result"], json!("0xhash07"));
}

#[tokio::test]
async fn test_status_endpoint_round_trip() {
    let relay = MockRpcServer::start(Behavior::Accept("0xhash08")).await;
    let upstream = MockRpcServer::start(Behavior::Accept("0x10")).await;
    let proxy = start_proxy(vec![("flashbots", &relay)], &upstream).await;

    proxy
        .client
        .post(format!("{}/rpc", proxy.base_url))
        .json(&write_body("0x02f870"))
        .send()
        .await
        .unwrap();

    let found = proxy
        .client
        .get(format!("{}/status/0xhash08", proxy.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(found.status(), reqwest::StatusCode::OK);
    let record: Value = found.json().await.unwrap();
    assert_eq!(record["endpoint"], json!("flashbots"));

    let missing = proxy
        .client
        .get(format!("{}/status/0xunknown", proxy.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_liveness_probe() {
    let relay = MockRpcServer::start(Behavior::Accept("0xhash09")).await;
    let upstream = MockRpcServer::start(Behavior::Accept("0x10")).await;
    let proxy = start_proxy(vec![("flashbots", &relay)], &upstream).await;

    let response = proxy
        .client
        .get(format!("{}/", proxy.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_body_yields_parse_error() {
    let relay = MockRpcServer::start(Behavior::Accept("0xhash10")).await;
    let upstream = MockRpcServer::start(Behavior::Accept("0x10")).await;
    let proxy = start_proxy(vec![("flashbots", &relay)], &upstream).await;

    let response: Value = proxy
        .client
        .post(format!("{}/rpc", proxy.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response["error"]["code"], json!(-32700));
    assert_eq!(relay.hits(), 0);
    assert_eq!(upstream.hits(), 0);
}
