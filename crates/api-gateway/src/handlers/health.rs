//! Health check and service endpoints

use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use shared::store::KeyValueStore;

use crate::openapi::ApiDoc;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub version: String,
}

/// Health check endpoint
///
/// Returns the health status of the gateway and its backing store.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    )
)]
pub async fn health_check(store: web::Data<Arc<dyn KeyValueStore>>) -> impl Responder {
    // A read on a reserved probe key exercises the store connection
    let store_status = match store.get("health:probe").await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let response = HealthResponse {
        status: if store_status == "connected" {
            "healthy"
        } else {
            "unhealthy"
        }
        .to_string(),
        store: store_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    if store_status == "connected" {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

/// OpenAPI JSON endpoint
///
/// Returns the OpenAPI 3.0 specification for the API.
#[utoipa::path(
    get,
    path = "/api/v1/openapi.json",
    tag = "Health",
    responses(
        (status = 200, description = "OpenAPI specification", content_type = "application/json")
    )
)]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().content_type("application/json").body(
        ApiDoc::openapi()
            .to_json()
            .unwrap_or_else(|_| "{}".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            store: "connected".to_string(),
            version: "0.1.0".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("connected"));
    }
}
