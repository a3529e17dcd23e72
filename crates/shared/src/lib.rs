//! Shared library for the CRM integration backend
//!
//! This crate provides common functionality used across the backend:
//! - Configuration management
//! - Error handling types
//! - Logging infrastructure
//! - Ephemeral key-value store (Redis-backed, with an in-memory variant)

pub mod config;
pub mod error;
pub mod store;

// Re-export commonly used types
pub use config::{Config, HubSpotConfig, RedisConfig, ServerConfig};
pub use error::{Error, Result};
pub use store::{KeyValueStore, MemoryStore, RedisStore};

/// Initialize tracing subscriber for structured logging
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shared=debug,api_gateway=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
