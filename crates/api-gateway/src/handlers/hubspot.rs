//! HubSpot integration handlers
//!
//! These handlers implement the popup-driven OAuth 2.0 authorization code
//! flow and the record-loading endpoint. The frontend posts tenant identity
//! as form data, opens the returned URL in a popup, and collects the
//! credentials once the popup has closed itself.

use actix_web::{web, HttpResponse, Responder};

use crate::models::{AuthUrlResponse, ErrorResponse};
use crate::services::{
    CallbackParams, CredentialStore, HubSpotItemFetcher, HubSpotOAuthService, OAuthFlowError,
};

/// Page served to the popup once the flow has completed; the opener polls
/// for the window closing
const CLOSE_WINDOW_HTML: &str = "<html>\n    <script>\n        window.close();\n    </script>\n</html>";

/// Form parameters identifying the tenant a flow is bound to
#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct TenantForm {
    pub user_id: String,
    pub org_id: String,
}

/// Query parameters delivered by the provider redirect
#[derive(Debug, serde::Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Initiate the HubSpot OAuth flow
///
/// POST /integrations/hubspot/authorize
///
/// Issues a fresh state/PKCE pair for (user, org) and returns the provider
/// authorization URL for the frontend to open in a popup.
#[utoipa::path(
    post,
    path = "/integrations/hubspot/authorize",
    tag = "HubSpot",
    responses(
        (status = 200, description = "Authorization URL issued", body = AuthUrlResponse),
        (status = 500, description = "State could not be stored", body = ErrorResponse)
    )
)]
pub async fn authorize(
    oauth: web::Data<HubSpotOAuthService>,
    form: web::Form<TenantForm>,
) -> impl Responder {
    match oauth.build_auth_url(&form.user_id, &form.org_id).await {
        Ok(auth_url) => HttpResponse::Ok().json(AuthUrlResponse { auth_url }),
        Err(e) => {
            tracing::error!(
                user_id = %form.user_id,
                org_id = %form.org_id,
                error = %e,
                "Failed to initiate HubSpot authorization"
            );
            error_response(&e)
        }
    }
}

/// Handle the OAuth callback from HubSpot
///
/// GET /integrations/hubspot/oauth2callback
///
/// Verifies the state, exchanges the code for tokens, caches the credentials,
/// and serves a page that closes the popup.
#[utoipa::path(
    get,
    path = "/integrations/hubspot/oauth2callback",
    tag = "HubSpot",
    responses(
        (status = 200, description = "Flow completed, popup closes itself", content_type = "text/html"),
        (status = 400, description = "Denied, missing parameters, or state mismatch", body = ErrorResponse),
        (status = 502, description = "Token exchange with HubSpot failed", body = ErrorResponse)
    )
)]
pub async fn oauth2callback(
    oauth: web::Data<HubSpotOAuthService>,
    query: web::Query<CallbackQuery>,
) -> impl Responder {
    let query = query.into_inner();
    let params = CallbackParams {
        code: query.code,
        state: query.state,
        error: query.error,
        error_description: query.error_description,
    };

    match oauth.handle_callback(&params).await {
        Ok(()) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(CLOSE_WINDOW_HTML),
        Err(e) => {
            tracing::error!(error = %e, "HubSpot OAuth callback failed");
            error_response(&e)
        }
    }
}

/// Hand out the cached credentials, once
///
/// POST /integrations/hubspot/credentials
///
/// One-shot read: the cached entry is deleted together with this response.
#[utoipa::path(
    post,
    path = "/integrations/hubspot/credentials",
    tag = "HubSpot",
    responses(
        (status = 200, description = "Credentials (consumed on read)"),
        (status = 404, description = "Nothing cached for this tenant", body = ErrorResponse)
    )
)]
pub async fn credentials(
    credential_store: web::Data<CredentialStore>,
    form: web::Form<TenantForm>,
) -> impl Responder {
    match credential_store.take(&form.user_id, &form.org_id).await {
        Ok(credentials) => HttpResponse::Ok().json(credentials),
        Err(e) => {
            tracing::warn!(
                user_id = %form.user_id,
                org_id = %form.org_id,
                error = %e,
                "Credential retrieval failed"
            );
            error_response(&e)
        }
    }
}

/// Exchange the stored refresh token for fresh credentials
///
/// POST /integrations/hubspot/refresh
///
/// Re-caches the refreshed credentials under the same tenant key and returns
/// them.
#[utoipa::path(
    post,
    path = "/integrations/hubspot/refresh",
    tag = "HubSpot",
    responses(
        (status = 200, description = "Refreshed credentials"),
        (status = 400, description = "Stored credentials have no refresh token", body = ErrorResponse),
        (status = 404, description = "Nothing cached for this tenant", body = ErrorResponse),
        (status = 502, description = "Refresh exchange with HubSpot failed", body = ErrorResponse)
    )
)]
pub async fn refresh(
    oauth: web::Data<HubSpotOAuthService>,
    form: web::Form<TenantForm>,
) -> impl Responder {
    match oauth
        .refresh_credentials(&form.user_id, &form.org_id)
        .await
    {
        Ok(credentials) => HttpResponse::Ok().json(credentials),
        Err(e) => {
            tracing::error!(
                user_id = %form.user_id,
                org_id = %form.org_id,
                error = %e,
                "Credential refresh failed"
            );
            error_response(&e)
        }
    }
}

/// Fetch and normalize CRM records
///
/// POST /integrations/hubspot/load
///
/// Takes the credentials JSON the caller previously collected and returns the
/// normalized item sequence with its count.
#[utoipa::path(
    post,
    path = "/integrations/hubspot/load",
    tag = "HubSpot",
    responses(
        (status = 200, description = "Normalized items", body = crate::models::ItemsResponse),
        (status = 400, description = "Malformed credentials", body = ErrorResponse),
        (status = 502, description = "CRM fetch failed", body = ErrorResponse)
    )
)]
pub async fn load_items(
    fetcher: web::Data<HubSpotItemFetcher>,
    body: web::Json<serde_json::Value>,
) -> impl Responder {
    match fetcher.fetch_items(&body).await {
        Ok(items) => HttpResponse::Ok().json(items),
        Err(e) => {
            tracing::error!(error = %e, "HubSpot item load failed");
            error_response(&e)
        }
    }
}

/// Map a flow error onto the HTTP surface
///
/// Client mistakes come back as 4xx; upstream failures as 502 carrying the
/// provider's status and body in `details` for diagnosis.
fn error_response(e: &OAuthFlowError) -> HttpResponse {
    match e {
        OAuthFlowError::ProviderDenied(detail) => {
            HttpResponse::BadRequest().json(ErrorResponse::new("provider_denied", detail))
        }
        OAuthFlowError::MissingParameter(name) => HttpResponse::BadRequest().json(
            ErrorResponse::new("missing_parameter", format!("Missing {} parameter", name)),
        ),
        OAuthFlowError::StateMismatch => HttpResponse::BadRequest()
            .json(ErrorResponse::new("state_mismatch", "State does not match")),
        OAuthFlowError::NoRefreshToken => HttpResponse::BadRequest().json(ErrorResponse::new(
            "no_refresh_token",
            "Stored credentials have no refresh token",
        )),
        OAuthFlowError::MalformedCredentials(msg) => {
            HttpResponse::BadRequest().json(ErrorResponse::new("malformed_credentials", msg))
        }
        OAuthFlowError::NotFound => HttpResponse::NotFound()
            .json(ErrorResponse::new("not_found", "No credentials found")),
        OAuthFlowError::TokenExchangeFailed(detail) => {
            HttpResponse::BadGateway().json(ErrorResponse::with_details(
                "token_exchange_failed",
                "Token exchange with HubSpot failed",
                serde_json::json!({ "upstream": detail }),
            ))
        }
        OAuthFlowError::RefreshFailed(detail) => {
            HttpResponse::BadGateway().json(ErrorResponse::with_details(
                "refresh_failed",
                "Token refresh with HubSpot failed",
                serde_json::json!({ "upstream": detail }),
            ))
        }
        OAuthFlowError::FetchFailed(detail) => {
            HttpResponse::BadGateway().json(ErrorResponse::with_details(
                "fetch_failed",
                "Failed to fetch records from HubSpot",
                serde_json::json!({ "upstream": detail }),
            ))
        }
        OAuthFlowError::Store(_) | OAuthFlowError::Internal(_) => HttpResponse::InternalServerError()
            .json(ErrorResponse::new(
                "internal_error",
                "An internal error occurred",
            )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_400() {
        for error in [
            OAuthFlowError::ProviderDenied("denied".to_string()),
            OAuthFlowError::MissingParameter("code"),
            OAuthFlowError::StateMismatch,
            OAuthFlowError::NoRefreshToken,
            OAuthFlowError::MalformedCredentials("bad".to_string()),
        ] {
            assert_eq!(error_response(&error).status(), 400);
        }
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(error_response(&OAuthFlowError::NotFound).status(), 404);
    }

    #[test]
    fn test_upstream_errors_map_to_502() {
        for error in [
            OAuthFlowError::TokenExchangeFailed("HTTP 400: nope".to_string()),
            OAuthFlowError::RefreshFailed("HTTP 401: expired".to_string()),
            OAuthFlowError::FetchFailed("contacts: HTTP 500".to_string()),
        ] {
            assert_eq!(error_response(&error).status(), 502);
        }
    }

    #[test]
    fn test_store_errors_map_to_500() {
        let error = OAuthFlowError::Store(shared::Error::store("connection reset"));
        assert_eq!(error_response(&error).status(), 500);
    }
}
