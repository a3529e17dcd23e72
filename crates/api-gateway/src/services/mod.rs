//! Business logic services for the integration gateway
//!
//! This module contains the OAuth flow and CRM fetch services, separate from
//! HTTP handlers and store access.

pub mod credential_store;
pub mod hubspot_oauth;
pub mod item_fetcher;
pub mod oauth_error;
pub mod pkce;
pub mod state_manager;

pub use credential_store::CredentialStore;
pub use hubspot_oauth::{CallbackParams, HubSpotOAuthService};
pub use item_fetcher::HubSpotItemFetcher;
pub use oauth_error::OAuthFlowError;
pub use state_manager::{StateManager, STATE_TTL};
