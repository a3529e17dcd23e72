//! Configuration management using environment variables
//!
//! # Security
//!
//! This module enforces security requirements for sensitive configuration:
//! - HubSpot client credentials must be set explicitly (no baked-in defaults)
//! - Production mode rejects a missing client secret outright
//! - Development mode only relaxes non-secret settings (hosts, ports, URLs)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;

/// OAuth scopes requested from HubSpot, covering read/write on contacts and
/// deals plus schema reads and the base oauth scope.
pub const HUBSPOT_SCOPES: &[&str] = &[
    "crm.objects.contacts.read",
    "crm.objects.contacts.write",
    "crm.objects.deals.read",
    "crm.objects.deals.write",
    "crm.schemas.contacts.read",
    "crm.schemas.deals.read",
    "oauth",
];

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Redis configuration
    pub redis: RedisConfig,

    /// Server configuration
    pub server: ServerConfig,

    /// HubSpot OAuth application configuration
    pub hubspot: HubSpotConfig,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis host
    pub host: String,

    /// Redis port
    pub port: u16,

    /// Redis password (optional)
    pub password: Option<String>,

    /// Direct Redis URL (takes precedence over host/port/password)
    /// Supports both `redis://` and `rediss://` (TLS) schemes
    pub url: Option<String>,
}

impl RedisConfig {
    /// Build a Redis connection URL
    ///
    /// If `url` is set (from REDIS_URL env var), uses that directly.
    /// Otherwise, builds URL from host/port/password components.
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        if let Some(password) = &self.password {
            format!("redis://:{}@{}:{}", password, self.host, self.port)
        } else {
            format!("redis://{}:{}", self.host, self.port)
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,
}

/// HubSpot OAuth application configuration
///
/// Injected into the OAuth services at construction, never read from
/// module-level globals, and never mutated after init.
#[derive(Debug, Clone, Deserialize)]
pub struct HubSpotConfig {
    /// OAuth client ID issued by HubSpot
    pub client_id: String,

    /// OAuth client secret issued by HubSpot
    pub client_secret: String,

    /// Redirect URI registered with the HubSpot app
    pub redirect_uri: String,

    /// Authorization endpoint (user-facing consent screen)
    pub auth_url: String,

    /// Token endpoint (code and refresh-token exchange)
    pub token_url: String,

    /// Base URL for the CRM object APIs
    pub api_base_url: String,
}

impl HubSpotConfig {
    /// Scopes requested during authorization, space-separated form
    pub fn scope_list(&self) -> Vec<String> {
        HUBSPOT_SCOPES.iter().map(|s| s.to_string()).collect()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Ok(Self {
            redis: RedisConfig {
                host: env::var("REDIS_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: env::var("REDIS_PORT")
                    .unwrap_or_else(|_| "6379".to_string())
                    .parse()
                    .map_err(|e| Error::config(format!("Invalid REDIS_PORT: {}", e)))?,
                password: env::var("REDIS_PASSWORD").ok(),
                // REDIS_URL takes precedence - supports TLS (rediss://)
                url: env::var("REDIS_URL").ok(),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .map_err(|e| Error::config(format!("Invalid SERVER_PORT: {}", e)))?,
            },
            hubspot: Self::load_hubspot_config()?,
        })
    }

    /// Load HubSpot OAuth app settings
    ///
    /// Client credentials are required; endpoint URLs default to the public
    /// HubSpot endpoints but can be overridden (e.g. pointed at a stub in
    /// integration tests).
    fn load_hubspot_config() -> Result<HubSpotConfig> {
        let client_id = env::var("HUBSPOT_CLIENT_ID")
            .map_err(|_| Error::config("HUBSPOT_CLIENT_ID must be set"))?;
        let client_secret = env::var("HUBSPOT_CLIENT_SECRET")
            .map_err(|_| Error::config("HUBSPOT_CLIENT_SECRET must be set"))?;

        let redirect_uri = env::var("HUBSPOT_REDIRECT_URI").unwrap_or_else(|_| {
            "http://localhost:8000/integrations/hubspot/oauth2callback".to_string()
        });

        Ok(HubSpotConfig {
            client_id,
            client_secret,
            redirect_uri,
            auth_url: env::var("HUBSPOT_AUTH_URL")
                .unwrap_or_else(|_| "https://app.hubspot.com/oauth/authorize".to_string()),
            token_url: env::var("HUBSPOT_TOKEN_URL")
                .unwrap_or_else(|_| "https://api.hubapi.com/oauth/v1/token".to_string()),
            api_base_url: env::var("HUBSPOT_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.hubapi.com".to_string()),
        })
    }
}
