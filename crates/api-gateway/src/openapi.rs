//! OpenAPI documentation configuration
//!
//! Uses utoipa to generate the OpenAPI 3.0 specification from Rust types and
//! handler annotations.

use utoipa::OpenApi;

use crate::handlers;
use crate::handlers::health::HealthResponse;
use crate::models::{AuthUrlResponse, Credentials, ErrorResponse, IntegrationItem, ItemsResponse};

/// OpenAPI documentation for the integration gateway
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CRM Integration Gateway",
        version = "0.1.0",
        description = "Delegated HubSpot access for (user, organization) pairs: \
                       OAuth 2.0 authorization code flow with PKCE, one-shot \
                       credential handout, token refresh, and normalized record \
                       loading.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "Development server")
    ),
    tags(
        (name = "Health", description = "Health check and service metadata"),
        (name = "HubSpot", description = "HubSpot OAuth flow and record loading")
    ),
    paths(
        handlers::health_check,
        handlers::openapi_json,
        handlers::authorize,
        handlers::oauth2callback,
        handlers::credentials,
        handlers::refresh,
        handlers::load_items,
    ),
    components(schemas(
        HealthResponse,
        ErrorResponse,
        AuthUrlResponse,
        Credentials,
        IntegrationItem,
        ItemsResponse,
    ))
)]
pub struct ApiDoc;
