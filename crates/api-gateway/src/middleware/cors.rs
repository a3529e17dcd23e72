//! CORS middleware
//!
//! The OAuth popup and the data form are served by a frontend on a different
//! origin, so cross-origin requests are part of normal operation.
//!
//! # Environment Configuration
//!
//! - `CORS_ALLOWED_ORIGINS`: Comma-separated list of allowed origins
//!   - Development default: `http://localhost:3000`
//!   - Production: Must be set explicitly with HTTPS URLs
//! - `ENVIRONMENT`: Set to "production" to enforce HTTPS-only origins

use actix_cors::Cors;
use actix_web::http::header;
use std::env;
use tracing::{debug, warn};

/// Create CORS middleware with an explicit origin whitelist
///
/// Production mode rejects non-HTTPS origins; wildcard origins are never
/// accepted.
pub fn cors() -> Cors {
    let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
    let is_production = environment.to_lowercase() == "production";

    let allowed_origins_str = env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| {
        if is_production {
            warn!(
                "CORS_ALLOWED_ORIGINS not set in production! CORS will be disabled. \
                 Set CORS_ALLOWED_ORIGINS to enable cross-origin requests."
            );
            String::new()
        } else {
            debug!("Using default CORS origins for development");
            "http://localhost:3000".to_string()
        }
    });

    let allowed_origins: Vec<String> = allowed_origins_str
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|origin| {
            if is_production && !origin.starts_with("https://") {
                warn!(
                    "Rejecting non-HTTPS origin in production: {}. \
                     Only HTTPS origins are allowed in production.",
                    origin
                );
                return false;
            }

            if origin == "*" {
                warn!(
                    "Wildcard (*) origin is not allowed. \
                     Specify explicit origins in CORS_ALLOWED_ORIGINS."
                );
                return false;
            }

            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                warn!(
                    "Invalid origin format: {}. Origins must start with http:// or https://",
                    origin
                );
                return false;
            }

            true
        })
        .collect();

    debug!(
        "CORS middleware initialized with {} allowed origins",
        allowed_origins.len()
    );

    let mut cors = Cors::default();

    if allowed_origins.is_empty() {
        warn!("No valid CORS origins configured. Cross-origin requests will be blocked.");
    } else {
        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
            debug!("CORS: Allowing origin: {}", origin);
        }
    }

    cors.allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .max_age(3600)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    async fn test_handler() -> HttpResponse {
        HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
    }

    #[actix_web::test]
    async fn test_cors_allowed_origin() {
        env::set_var("ENVIRONMENT", "development");
        env::set_var("CORS_ALLOWED_ORIGINS", "http://localhost:3000");

        let app = test::init_service(
            App::new()
                .wrap(cors())
                .route("/test", web::get().to(test_handler)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/test")
            .insert_header(("Origin", "http://localhost:3000"))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        env::remove_var("ENVIRONMENT");
        env::remove_var("CORS_ALLOWED_ORIGINS");
    }

    #[actix_web::test]
    async fn test_cors_disallowed_origin() {
        env::set_var("ENVIRONMENT", "development");
        env::set_var("CORS_ALLOWED_ORIGINS", "http://localhost:3000");

        let app = test::init_service(
            App::new()
                .wrap(cors())
                .route("/test", web::get().to(test_handler)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/test")
            .insert_header(("Origin", "http://evil.example"))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(!resp
            .headers()
            .contains_key("access-control-allow-origin"));

        env::remove_var("ENVIRONMENT");
        env::remove_var("CORS_ALLOWED_ORIGINS");
    }

    #[actix_web::test]
    async fn test_cors_rejects_wildcard() {
        env::set_var("ENVIRONMENT", "development");
        env::set_var("CORS_ALLOWED_ORIGINS", "*");

        let app = test::init_service(
            App::new()
                .wrap(cors())
                .route("/test", web::get().to(test_handler)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/test")
            .insert_header(("Origin", "http://evil.example"))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(!resp
            .headers()
            .contains_key("access-control-allow-origin"));

        env::remove_var("ENVIRONMENT");
        env::remove_var("CORS_ALLOWED_ORIGINS");
    }
}
