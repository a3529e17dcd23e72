//! Anti-CSRF state issuance and verification
//!
//! Each authorization attempt gets a fresh random state token bound to the
//! (user, org) pair, cached together with its PKCE verifier for the lifetime
//! of the pending flow. The callback must present the exact state that was
//! stored; verification consumes both entries, so a replayed or retried
//! callback fails deterministically.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;

use shared::store::{self, KeyValueStore};

use crate::services::oauth_error::OAuthFlowError;
use crate::services::pkce;

/// Lifetime of a pending authorization flow
pub const STATE_TTL: Duration = Duration::from_secs(600);

/// State record cached under `state:{org_id}:{user_id}` and round-tripped
/// (URL-safe base64 of its JSON form) through the provider redirect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRecord {
    pub state: String,
    pub user_id: String,
    pub org_id: String,
}

/// Output of a successful state issuance
#[derive(Debug, Clone)]
pub struct IssuedAuthorization {
    /// Encoded state blob to embed in the authorization URL
    pub encoded_state: String,
    /// PKCE challenge to embed in the authorization URL
    pub code_challenge: String,
}

/// Output of a successful verification: the tenant the flow was bound to and
/// the PKCE verifier needed for the token exchange
#[derive(Debug, Clone)]
pub struct ConsumedState {
    pub user_id: String,
    pub org_id: String,
    pub verifier: String,
}

/// Issues and verifies per-flow state tokens and PKCE verifiers
#[derive(Clone)]
pub struct StateManager {
    store: Arc<dyn KeyValueStore>,
}

impl StateManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Start a new flow for (user, org)
    ///
    /// Overwrites any pending flow for the same pair: last writer wins, and a
    /// stale in-flight popup will then fail verification. Both writes must
    /// land before the authorization URL is handed to the caller.
    pub async fn issue(
        &self,
        user_id: &str,
        org_id: &str,
    ) -> Result<IssuedAuthorization, OAuthFlowError> {
        let record = StateRecord {
            state: pkce::random_token(),
            user_id: user_id.to_string(),
            org_id: org_id.to_string(),
        };
        let pair = pkce::generate();

        let record_json = serde_json::to_string(&record)
            .map_err(|e| OAuthFlowError::Internal(format!("Failed to encode state: {}", e)))?;
        let encoded_state = URL_SAFE_NO_PAD.encode(record_json.as_bytes());

        let state_key = store::state_key(org_id, user_id);
        let verifier_key = store::verifier_key(org_id, user_id);
        tokio::try_join!(
            self.store.set(&state_key, &record_json, STATE_TTL),
            self.store
                .set(&verifier_key, &pair.verifier, STATE_TTL),
        )?;

        tracing::debug!(user_id, org_id, "Issued authorization state");

        Ok(IssuedAuthorization {
            encoded_state,
            code_challenge: pair.challenge,
        })
    }

    /// Validate the callback's state blob and consume the pending flow
    ///
    /// Fails with `StateMismatch` when the blob is malformed, nothing is
    /// pending for the embedded (org, user), or the stored state differs from
    /// the presented one. On success both cache entries are deleted; invoking
    /// this twice for the same flow fails on the second call.
    pub async fn verify_and_consume(
        &self,
        encoded_state: &str,
    ) -> Result<ConsumedState, OAuthFlowError> {
        let decoded = URL_SAFE_NO_PAD
            .decode(encoded_state.as_bytes())
            .map_err(|_| OAuthFlowError::StateMismatch)?;
        let presented: StateRecord =
            serde_json::from_slice(&decoded).map_err(|_| OAuthFlowError::StateMismatch)?;

        let state_key = store::state_key(&presented.org_id, &presented.user_id);
        let verifier_key = store::verifier_key(&presented.org_id, &presented.user_id);

        let (saved, verifier) = tokio::try_join!(
            self.store.get(&state_key),
            self.store.get(&verifier_key),
        )?;
        let (Some(saved), Some(verifier)) = (saved, verifier) else {
            return Err(OAuthFlowError::StateMismatch);
        };

        let saved: StateRecord =
            serde_json::from_str(&saved).map_err(|_| OAuthFlowError::StateMismatch)?;
        if !bool::from(saved.state.as_bytes().ct_eq(presented.state.as_bytes())) {
            return Err(OAuthFlowError::StateMismatch);
        }

        tokio::try_join!(
            self.store.delete(&state_key),
            self.store.delete(&verifier_key),
        )?;

        tracing::debug!(
            user_id = %presented.user_id,
            org_id = %presented.org_id,
            "Consumed authorization state"
        );

        Ok(ConsumedState {
            user_id: presented.user_id,
            org_id: presented.org_id,
            verifier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::store::MemoryStore;

    fn manager() -> StateManager {
        StateManager::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_issue_then_verify_succeeds_once() {
        let manager = manager();
        let issued = manager.issue("u1", "o1").await.unwrap();

        let consumed = manager
            .verify_and_consume(&issued.encoded_state)
            .await
            .unwrap();
        assert_eq!(consumed.user_id, "u1");
        assert_eq!(consumed.org_id, "o1");
        assert!(!consumed.verifier.is_empty());

        // Entries are gone; a retried callback must fail
        let replay = manager.verify_and_consume(&issued.encoded_state).await;
        assert!(matches!(replay, Err(OAuthFlowError::StateMismatch)));
    }

    #[tokio::test]
    async fn test_tampered_state_fails() {
        let manager = manager();
        let issued = manager.issue("u1", "o1").await.unwrap();

        // Re-encode the blob with a single flipped state byte
        let decoded = URL_SAFE_NO_PAD.decode(issued.encoded_state.as_bytes()).unwrap();
        let mut record: StateRecord = serde_json::from_slice(&decoded).unwrap();
        let mut state = record.state.into_bytes();
        state[0] = state[0].wrapping_add(1);
        record.state = String::from_utf8(state).unwrap_or_else(|_| "x".repeat(43));
        let tampered =
            URL_SAFE_NO_PAD.encode(serde_json::to_string(&record).unwrap().as_bytes());

        let result = manager.verify_and_consume(&tampered).await;
        assert!(matches!(result, Err(OAuthFlowError::StateMismatch)));
    }

    #[tokio::test]
    async fn test_garbage_blob_fails() {
        let manager = manager();
        let result = manager.verify_and_consume("not-base64-json!").await;
        assert!(matches!(result, Err(OAuthFlowError::StateMismatch)));
    }

    #[tokio::test]
    async fn test_unknown_tenant_fails() {
        let manager = manager();
        let issued = manager.issue("u1", "o1").await.unwrap();

        // Blob points at a pair with no pending flow
        let decoded = URL_SAFE_NO_PAD.decode(issued.encoded_state.as_bytes()).unwrap();
        let mut record: StateRecord = serde_json::from_slice(&decoded).unwrap();
        record.user_id = "someone-else".to_string();
        let foreign =
            URL_SAFE_NO_PAD.encode(serde_json::to_string(&record).unwrap().as_bytes());

        let result = manager.verify_and_consume(&foreign).await;
        assert!(matches!(result, Err(OAuthFlowError::StateMismatch)));
    }

    #[tokio::test]
    async fn test_reissue_invalidates_prior_flow() {
        let manager = manager();
        let first = manager.issue("u1", "o1").await.unwrap();
        let second = manager.issue("u1", "o1").await.unwrap();

        // The stale popup loses; the fresh flow wins
        let stale = manager.verify_and_consume(&first.encoded_state).await;
        assert!(matches!(stale, Err(OAuthFlowError::StateMismatch)));

        // Reissue after the failed stale attempt, since verification on a
        // mismatch leaves the fresh entries in place
        let consumed = manager.verify_and_consume(&second.encoded_state).await;
        assert!(consumed.is_ok());
    }
}
