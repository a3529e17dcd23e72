//! Ephemeral key-value store for transient OAuth state
//!
//! The OAuth flow keeps all of its short-lived material (anti-CSRF state,
//! PKCE verifiers, exchanged credentials) in a TTL-capable key-value store.
//! Nothing here is durable: entries expire on their own and consumers delete
//! them explicitly when a flow completes.
//!
//! # Key Prefixes
//!
//! - `state:{org_id}:{user_id}` - pending authorization state record
//! - `verifier:{org_id}:{user_id}` - PKCE code verifier for that flow
//! - `credentials:{org_id}:{user_id}` - exchanged OAuth credentials
//!
//! Correctness of the concurrent flows relies on the backing store's per-key
//! atomicity; `take` must be an atomic get-and-delete, never a read followed
//! by a delete.

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::{create_client, RedisStore};

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// TTL-capable key-value store used for transient OAuth state
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store a value under a key with a time-to-live
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Get a value, `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Delete a key; deleting an absent key is not an error
    async fn delete(&self, key: &str) -> Result<()>;

    /// Atomically get and delete a value
    ///
    /// Two concurrent `take` calls for the same key observe exactly one
    /// `Some` and one `None`.
    async fn take(&self, key: &str) -> Result<Option<String>>;
}

// ============================================================================
// Key Builders
// ============================================================================

/// Build the key for a pending authorization state record
pub fn state_key(org_id: &str, user_id: &str) -> String {
    format!("state:{}:{}", org_id, user_id)
}

/// Build the key for a cached PKCE code verifier
pub fn verifier_key(org_id: &str, user_id: &str) -> String {
    format!("verifier:{}:{}", org_id, user_id)
}

/// Build the key for cached OAuth credentials
pub fn credentials_key(org_id: &str, user_id: &str) -> String {
    format!("credentials:{}:{}", org_id, user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_key() {
        assert_eq!(state_key("org_1", "user_1"), "state:org_1:user_1");
    }

    #[test]
    fn test_verifier_key() {
        assert_eq!(verifier_key("org_1", "user_1"), "verifier:org_1:user_1");
    }

    #[test]
    fn test_credentials_key() {
        assert_eq!(
            credentials_key("org_1", "user_1"),
            "credentials:org_1:user_1"
        );
    }
}
