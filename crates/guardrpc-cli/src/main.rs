//! # Guardrpc CLI Entry Point
//!
//! Starts the relay-protected JSON-RPC proxy.
//!
//! ## Usage
//!
//! ```bash
//! # Proxy mainnet writes through two relays, forward reads upstream
//! guardrpc -b 0.0.0.0:8545 \
//!     -r flashbots=https://relay.flashbots.net \
//!     -r bloxroute=https://api.blxrbdn.com \
//!     -n mainnet=https://eth.llamarpc.com \
//!     -n sepolia=https://rpc.sepolia.org
//! ```
//!
//! Relays and networks are `name=url` pairs. Write-class calls are only
//! accepted on the default network (`mainnet` unless overridden with
//! `--default-network`); other networks forward reads only.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use argh::FromArgs;
use guardrpc_common::{KvStore, MemoryKvStore};
use guardrpc_relay::{
    Dispatcher, HttpServer, HttpTransport, Network, NetworkRegistry, RelayEndpoint, RelayTransport,
    RouterConfig, RpcRouter, StatsStore,
};
use tracing::info;

/// How often the in-process store sweeps expired entries.
const JANITOR_INTERVAL: Duration = Duration::from_secs(60);

#[derive(FromArgs)]
/// Relay-protected JSON-RPC proxy with adaptive endpoint ranking.
struct Cli {
    /// socket address to bind (default 127.0.0.1:8545)
    #[argh(option, short = 'b', default = "\"127.0.0.1:8545\".parse().unwrap()")]
    bind: SocketAddr,

    /// relay endpoint as name=url (repeatable)
    #[argh(option, short = 'r')]
    relay: Vec<String>,

    /// network upstream as name=url (repeatable)
    #[argh(option, short = 'n')]
    network: Vec<String>,

    /// network served by the unscoped /rpc path (default mainnet)
    #[argh(option, default = "String::from(\"mainnet\")")]
    default_network: String,

    /// per-attempt relay timeout in milliseconds (default 3500)
    #[argh(option)]
    attempt_timeout_ms: Option<u64>,

    /// read forwarding timeout in milliseconds (default 8000)
    #[argh(option)]
    forward_timeout_ms: Option<u64>,

    /// score floor for endpoints with no history (default 0.0)
    #[argh(option)]
    untried_score: Option<f64>,
}

/// Split a `name=url` pair, validating the URL scheme.
fn parse_pair(raw: &str, what: &str) -> Result<(String, String)> {
    let (name, url) = raw
        .split_once('=')
        .with_context(|| format!("{what} '{raw}' must be name=url"))?;
    if name.is_empty() {
        bail!("{what} '{raw}' has an empty name");
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        bail!("{what} url '{url}' must start with http:// or https://");
    }
    Ok((name.to_string(), url.to_string()))
}

fn build_config(cli: &Cli) -> Result<(RouterConfig, NetworkRegistry)> {
    let mut relays = Vec::new();
    for raw in &cli.relay {
        let (id, url) = parse_pair(raw, "relay")?;
        relays.push(RelayEndpoint::new(id, url));
    }

    let mut networks = HashMap::new();
    for raw in &cli.network {
        let (name, url) = parse_pair(raw, "network")?;
        // Only the default network gets relay protection; writes elsewhere
        // are rejected by the router.
        let relay_protected = name == cli.default_network && !relays.is_empty();
        networks.insert(name, Network::new(url, relay_protected));
    }
    if networks.is_empty() {
        bail!("at least one --network name=url is required");
    }

    let mut config = RouterConfig {
        relays,
        ..Default::default()
    };
    if let Some(ms) = cli.attempt_timeout_ms {
        config.attempt_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = cli.forward_timeout_ms {
        config.forward_timeout = Duration::from_millis(ms);
    }
    if let Some(floor) = cli.untried_score {
        config.weights.untried_score = floor;
    }

    let registry = NetworkRegistry::new(cli.default_network.clone(), networks)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok((config, registry))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli: Cli = argh::from_env();
    let (config, networks) = build_config(&cli)?;

    info!(
        relays = config.relays.len(),
        networks = ?networks.names(),
        default_network = networks.default_network(),
        "starting guardrpc"
    );

    let kv = Arc::new(MemoryKvStore::new());
    kv.clone().spawn_janitor(JANITOR_INTERVAL);

    let transport = Arc::new(HttpTransport::new()) as Arc<dyn RelayTransport>;
    let stats = StatsStore::new(kv.clone() as Arc<dyn KvStore>, config.stats_ttl);
    let dispatcher = Dispatcher::new(transport.clone(), stats, config.weights.clone());
    let router = Arc::new(RpcRouter::new(
        config,
        networks,
        dispatcher,
        transport,
        kv as Arc<dyn KvStore>,
    ));

    HttpServer::new(router)
        .run(cli.bind)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))
}
