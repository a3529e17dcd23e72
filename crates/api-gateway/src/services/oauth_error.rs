//! Error taxonomy for the OAuth flow and CRM fetch pipeline
//!
//! Every variant is terminal for the operation it occurs in; nothing here is
//! retried internally. A failed flow requires the caller to re-initiate and
//! obtain a fresh state/verifier pair.

use thiserror::Error;

/// Errors surfaced by the HubSpot integration services
#[derive(Debug, Error)]
pub enum OAuthFlowError {
    /// The provider reported an `error` parameter on the callback
    #[error("Authorization denied by provider: {0}")]
    ProviderDenied(String),

    /// The callback is missing a required query parameter
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// The presented state is absent, expired, or does not match the stored one
    #[error("State does not match")]
    StateMismatch,

    /// The code-for-token exchange failed
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// No credentials cached for this (org, user), or already consumed
    #[error("No credentials found")]
    NotFound,

    /// The cached credentials carry no refresh token
    #[error("Stored credentials have no refresh token")]
    NoRefreshToken,

    /// The refresh-token exchange failed
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// The CRM object listing could not be fetched
    #[error("Failed to fetch {0}")]
    FetchFailed(String),

    /// Credential input could not be parsed or lacks an access token
    #[error("Malformed credentials: {0}")]
    MalformedCredentials(String),

    /// Backing store failure
    #[error("Store error: {0}")]
    Store(#[from] shared::Error),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}
