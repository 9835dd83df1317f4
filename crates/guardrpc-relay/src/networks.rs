//! Static network registry.
//!
//! Maps a network identifier to its read-only upstream URL and whether
//! write-class calls on it go through the relay cascade. Unknown
//! identifiers are rejected here, before any dispatch happens.

use std::collections::HashMap;

use guardrpc_common::{GuardError, Result};

/// One configured network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    /// Upstream URL read-class calls are forwarded to.
    pub upstream_url: String,
    /// Whether write-class calls are accepted (routed via relays).
    pub relay_protected: bool,
}

impl Network {
    pub fn new(upstream_url: impl Into<String>, relay_protected: bool) -> Self {
        Self {
            upstream_url: upstream_url.into(),
            relay_protected,
        }
    }
}

/// Registry of configured networks with a default for the unscoped path.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    default_network: String,
    networks: HashMap<String, Network>,
}

impl NetworkRegistry {
    /// Build a registry. The default network must be present in the map.
    pub fn new(default_network: impl Into<String>, networks: HashMap<String, Network>) -> Result<Self> {
        let default_network = default_network.into();
        if !networks.contains_key(&default_network) {
            return Err(GuardError::Validation(format!(
                "default network '{default_network}' is not configured"
            )));
        }
        Ok(Self {
            default_network,
            networks,
        })
    }

    /// Resolve a network identifier; `None` selects the default network.
    pub fn resolve<'a>(&'a self, network: Option<&'a str>) -> Result<(&'a str, &'a Network)> {
        let name = network.unwrap_or(&self.default_network);
        match self.networks.get(name) {
            Some(network) => Ok((name, network)),
            None => Err(GuardError::UnknownNetwork(name.to_string())),
        }
    }

    pub fn default_network(&self) -> &str {
        &self.default_network
    }

    /// Configured network names, for startup logging.
    pub fn names(&self) -> Vec<&str> {
        self.networks.keys().map(String::as_str).collect()
    }
}
