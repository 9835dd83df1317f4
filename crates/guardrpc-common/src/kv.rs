//! Durable Key/Value Collaborator
//!
//! The router persists two kinds of documents: per-endpoint performance
//! records and submission status records. Both go through the narrow
//! [`KvStore`] interface so the core never assumes a backing technology;
//! a production deployment plugs in a durable store, tests and single-node
//! runs use the in-process [`MemoryKvStore`].
//!
//! The contract is deliberately small: `get` returns the value or absent,
//! `put` persists and refreshes the entry's expiration. There is no atomic
//! read-modify-write; concurrent writers race and the last write wins.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;

/// Durable key/value store with per-entry expiration.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Persist `value` under `key` and (re)set its time-to-live.
    async fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<()>;
}

struct StoredEntry {
    value: Value,
    expires_at: Instant,
}

/// In-process [`KvStore`] backed by a sharded concurrent map.
///
/// Entries expire lazily on read; [`MemoryKvStore::spawn_janitor`] adds a
/// background sweep so idle entries do not accumulate.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: DashMap<String, StoredEntry>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry. Returns how many were evicted.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }

    /// Start a background task sweeping expired entries every `interval`.
    pub fn spawn_janitor(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let store = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let evicted = store.sweep();
                if evicted > 0 {
                    debug!(evicted, "evicted expired kv entries");
                }
            }
        })
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.value.clone()));
            }
        }
        // Expired entries are removed on the read path rather than left
        // for the janitor, so a get after expiry never resurrects them.
        self.entries
            .remove_if(key, |_, entry| entry.expires_at <= Instant::now());
        Ok(None)
    }

    async fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            StoredEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}
