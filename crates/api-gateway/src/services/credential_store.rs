//! One-shot accessor over cached OAuth credentials
//!
//! Reads are destructive: handing credentials to a caller removes them from
//! the cache in the same store operation. Callers needing durability must
//! re-cache after reading; the refresh flow re-stores rotated credentials
//! itself.

use std::sync::Arc;

use shared::store::{self, KeyValueStore};

use crate::models::Credentials;
use crate::services::oauth_error::OAuthFlowError;

/// One-shot credential accessor keyed by (org, user)
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Retrieve and delete the cached credentials for (user, org)
    ///
    /// Fails with `NotFound` when nothing is cached: never authorized, TTL
    /// expired, or already consumed by a prior `take`. Two concurrent calls
    /// observe exactly one success; the delete rides on the store's atomic
    /// get-and-delete, not a read-then-delete sequence.
    pub async fn take(&self, user_id: &str, org_id: &str) -> Result<Credentials, OAuthFlowError> {
        let raw = self
            .store
            .take(&store::credentials_key(org_id, user_id))
            .await?
            .ok_or(OAuthFlowError::NotFound)?;

        serde_json::from_str(&raw)
            .map_err(|e| OAuthFlowError::MalformedCredentials(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::store::MemoryStore;
    use std::time::Duration;

    async fn seeded_store() -> (CredentialStore, Arc<dyn KeyValueStore>) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store
            .set(
                "credentials:o1:u1",
                r#"{"access_token":"tok123","expires_in":1800}"#,
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        (CredentialStore::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_take_returns_credentials_once() {
        let (credentials, _) = seeded_store().await;

        let first = credentials.take("u1", "o1").await.unwrap();
        assert_eq!(first.access_token, "tok123");

        let second = credentials.take("u1", "o1").await;
        assert!(matches!(second, Err(OAuthFlowError::NotFound)));
    }

    #[tokio::test]
    async fn test_take_unknown_tenant() {
        let (credentials, _) = seeded_store().await;
        let result = credentials.take("u2", "o1").await;
        assert!(matches!(result, Err(OAuthFlowError::NotFound)));
    }

    #[tokio::test]
    async fn test_take_malformed_payload() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store
            .set("credentials:o1:u1", "not json", Duration::from_secs(60))
            .await
            .unwrap();
        let credentials = CredentialStore::new(store);

        let result = credentials.take("u1", "o1").await;
        assert!(matches!(result, Err(OAuthFlowError::MalformedCredentials(_))));
    }

    #[tokio::test]
    async fn test_concurrent_take_exactly_once() {
        let (credentials, _) = seeded_store().await;

        let a = {
            let credentials = credentials.clone();
            tokio::spawn(async move { credentials.take("u1", "o1").await })
        };
        let b = {
            let credentials = credentials.clone();
            tokio::spawn(async move { credentials.take("u1", "o1").await })
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert!(a.is_ok() ^ b.is_ok());
        for result in [a, b] {
            if let Err(e) = result {
                assert!(matches!(e, OAuthFlowError::NotFound));
            }
        }
    }
}
