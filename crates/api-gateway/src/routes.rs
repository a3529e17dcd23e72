//! Route configuration for the API

use actix_web::web;

use crate::handlers;

/// Configure all routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Service endpoints (no auth required)
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(handlers::health_check))
            .route("/openapi.json", web::get().to(handlers::openapi_json)),
    );

    // HubSpot integration endpoints, shaped for the popup-driven frontend
    cfg.service(
        web::scope("/integrations/hubspot")
            .route("/authorize", web::post().to(handlers::authorize))
            .route("/oauth2callback", web::get().to(handlers::oauth2callback))
            .route("/credentials", web::post().to(handlers::credentials))
            .route("/refresh", web::post().to(handlers::refresh))
            .route("/load", web::post().to(handlers::load_items)),
    );
}
