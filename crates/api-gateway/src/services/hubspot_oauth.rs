//! HubSpot OAuth 2.0 authorization-code flow with PKCE
//!
//! This service owns the three provider-facing legs of the flow:
//! authorization-URL construction, callback handling (state verification plus
//! code-for-token exchange), and refresh-token exchange. Authorization URLs
//! are built with the `oauth2` crate; token exchanges go through `reqwest`
//! directly as plain form POSTs.
//!
//! # Security
//!
//! - CSRF protection via a store-verified state parameter bound to
//!   (user, org); verification is strict and consumes the pending flow
//! - PKCE (S256) on every authorization
//! - Credentials are cached with a TTL matching the token lifetime and are
//!   consumed on first read

use oauth2::{
    basic::BasicClient, AuthUrl, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope, TokenUrl,
};
use std::sync::Arc;
use std::time::Duration;

use shared::store::{self, KeyValueStore};
use shared::HubSpotConfig;

use crate::models::Credentials;
use crate::services::oauth_error::OAuthFlowError;
use crate::services::state_manager::StateManager;

/// Fixed TTL applied when re-caching refreshed credentials
///
/// Deliberately independent of the refresh response's `expires_in`.
const REFRESHED_CREDENTIALS_TTL: Duration = Duration::from_secs(3600);

/// Query parameters delivered to the OAuth callback
#[derive(Debug, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Service for the HubSpot OAuth 2.0 flow
#[derive(Clone)]
pub struct HubSpotOAuthService {
    config: HubSpotConfig,
    state_manager: StateManager,
    store: Arc<dyn KeyValueStore>,
    http_client: reqwest::Client,
}

impl HubSpotOAuthService {
    pub fn new(config: HubSpotConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            state_manager: StateManager::new(store.clone()),
            store,
            http_client,
        }
    }

    /// Build the provider authorization URL for (user, org)
    ///
    /// Issues a fresh state/verifier pair and composes the consent-screen URL
    /// with the fixed scope set, the encoded state blob, and the S256 PKCE
    /// challenge. No network call is made.
    pub async fn build_auth_url(
        &self,
        user_id: &str,
        org_id: &str,
    ) -> Result<String, OAuthFlowError> {
        let issued = self.state_manager.issue(user_id, org_id).await?;

        let auth_url = AuthUrl::new(self.config.auth_url.clone())
            .map_err(|e| OAuthFlowError::Internal(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(self.config.token_url.clone())
            .map_err(|e| OAuthFlowError::Internal(format!("Invalid token URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(self.config.redirect_uri.clone())
            .map_err(|e| OAuthFlowError::Internal(format!("Invalid redirect URI: {}", e)))?;

        let client = BasicClient::new(
            ClientId::new(self.config.client_id.clone()),
            Some(ClientSecret::new(self.config.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url);

        let mut auth_request = client.authorize_url(|| CsrfToken::new(issued.encoded_state));

        for scope in self.config.scope_list() {
            auth_request = auth_request.add_scope(Scope::new(scope));
        }

        // The verifier half of the pair is already cached by the state
        // manager; only the challenge travels to the provider
        let (auth_url, _) = auth_request
            .add_extra_param("code_challenge", issued.code_challenge)
            .add_extra_param("code_challenge_method", "S256")
            .url();

        Ok(auth_url.to_string())
    }

    /// Handle the provider redirect back to us
    ///
    /// Validates the state, exchanges the code (plus the recovered PKCE
    /// verifier) for tokens, and caches the credentials keyed by (org, user)
    /// with a TTL equal to the token lifetime. Failures are terminal; the
    /// caller must re-initiate the flow.
    pub async fn handle_callback(&self, params: &CallbackParams) -> Result<(), OAuthFlowError> {
        if let Some(error) = &params.error {
            let detail = params
                .error_description
                .clone()
                .unwrap_or_else(|| error.clone());
            return Err(OAuthFlowError::ProviderDenied(detail));
        }

        let code = params
            .code
            .as_deref()
            .ok_or(OAuthFlowError::MissingParameter("code"))?;
        let encoded_state = params
            .state
            .as_deref()
            .ok_or(OAuthFlowError::MissingParameter("state"))?;

        let consumed = self.state_manager.verify_and_consume(encoded_state).await?;

        let credentials = self.exchange_code(code, &consumed.verifier).await?;

        let json = serde_json::to_string(&credentials)
            .map_err(|e| OAuthFlowError::Internal(format!("Failed to encode credentials: {}", e)))?;
        self.store
            .set(
                &store::credentials_key(&consumed.org_id, &consumed.user_id),
                &json,
                Duration::from_secs(credentials.expires_in),
            )
            .await?;

        tracing::info!(
            user_id = %consumed.user_id,
            org_id = %consumed.org_id,
            expires_in = credentials.expires_in,
            "Stored HubSpot credentials"
        );

        Ok(())
    }

    /// Exchange a refresh token for a fresh access token
    ///
    /// Reads the cached credentials non-destructively, performs the refresh
    /// exchange, and re-caches the result under the same key. Providers may
    /// omit rotation; the prior refresh token is kept in that case.
    pub async fn refresh_credentials(
        &self,
        user_id: &str,
        org_id: &str,
    ) -> Result<Credentials, OAuthFlowError> {
        let key = store::credentials_key(org_id, user_id);

        let current = self
            .store
            .get(&key)
            .await?
            .ok_or(OAuthFlowError::NotFound)?;
        let current: Credentials = serde_json::from_str(&current)
            .map_err(|e| OAuthFlowError::MalformedCredentials(e.to_string()))?;
        let refresh_token = current
            .refresh_token
            .ok_or(OAuthFlowError::NoRefreshToken)?;

        let response = self
            .http_client
            .post(&self.config.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| OAuthFlowError::RefreshFailed(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthFlowError::RefreshFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let mut refreshed: Credentials = response
            .json()
            .await
            .map_err(|e| OAuthFlowError::RefreshFailed(format!("Invalid JSON: {}", e)))?;

        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = Some(refresh_token);
        }

        let json = serde_json::to_string(&refreshed)
            .map_err(|e| OAuthFlowError::Internal(format!("Failed to encode credentials: {}", e)))?;
        self.store
            .set(&key, &json, REFRESHED_CREDENTIALS_TTL)
            .await?;

        tracing::info!(user_id, org_id, "Refreshed HubSpot credentials");

        Ok(refreshed)
    }

    /// Exchange an authorization code plus PKCE verifier for tokens
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<Credentials, OAuthFlowError> {
        let response = self
            .http_client
            .post(&self.config.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("code", code),
                ("code_verifier", code_verifier),
            ])
            .send()
            .await
            .map_err(|e| OAuthFlowError::TokenExchangeFailed(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthFlowError::TokenExchangeFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let credentials: Credentials = response
            .json()
            .await
            .map_err(|e| OAuthFlowError::TokenExchangeFailed(format!("Invalid JSON: {}", e)))?;

        if credentials.access_token.is_empty() {
            return Err(OAuthFlowError::TokenExchangeFailed(
                "No access token in response".to_string(),
            ));
        }

        Ok(credentials)
    }
}
