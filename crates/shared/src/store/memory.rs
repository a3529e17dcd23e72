//! In-memory implementation of the ephemeral key-value store
//!
//! Used by tests and store-less local development. Entries carry an absolute
//! deadline and are treated as absent once it passes; expired entries are
//! dropped lazily on access. `DashMap::remove` gives `take` the same
//! exactly-once semantics as Redis `GETDEL`.

use crate::error::Result;
use crate::store::KeyValueStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory TTL store over a concurrent map
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            // only drop the entry if it is still the expired one
            self.entries.remove_if(key, |_, entry| entry.is_expired());
        }
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>> {
        // remove() is atomic, so concurrent takers race for a single winner
        match self.entries.remove(key) {
            Some((_, entry)) if !entry.is_expired() => Ok(Some(entry.value)),
            _ => Ok(None),
        }
    }
}
