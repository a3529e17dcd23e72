//! CRM integration gateway
//!
//! HTTP service driving delegated HubSpot access: OAuth 2.0 authorization
//! code flow with PKCE, one-shot credential handout, token refresh, and
//! normalized record loading.

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use api_gateway::services::{CredentialStore, HubSpotItemFetcher, HubSpotOAuthService};
use api_gateway::{middleware, routes};
use shared::store::{self, KeyValueStore};
use shared::Config;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    shared::init_tracing();

    tracing::info!("Starting integration gateway...");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Connect the transient state store
    let redis = store::create_client(&config.redis.connection_url())
        .await
        .context("Failed to connect to Redis")?;
    let kv_store: Arc<dyn KeyValueStore> = Arc::new(store::RedisStore::new(redis));

    // Construct services; configuration is injected here and never mutated
    let oauth = web::Data::new(HubSpotOAuthService::new(
        config.hubspot.clone(),
        kv_store.clone(),
    ));
    let credential_store = web::Data::new(CredentialStore::new(kv_store.clone()));
    let item_fetcher = web::Data::new(HubSpotItemFetcher::new(
        config.hubspot.api_base_url.clone(),
    ));
    let kv_store = web::Data::new(kv_store);

    let server_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Integration gateway listening on {}", server_addr);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            // Request logging
            .wrap(TracingLogger::default())
            // CORS for the popup-driven frontend
            .wrap(middleware::cors())
            // Shared state
            .app_data(oauth.clone())
            .app_data(credential_store.clone())
            .app_data(item_fetcher.clone())
            .app_data(kv_store.clone())
            // Configure routes
            .configure(routes::configure)
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind to {}", server_addr))?
    .run()
    .await
    .context("Server error")?;

    Ok(())
}
