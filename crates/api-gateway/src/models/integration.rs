//! Integration data model: OAuth credentials and normalized CRM items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn default_expires_in() -> u64 {
    3600
}

fn default_visibility() -> bool {
    true
}

/// OAuth credentials exchanged with the provider
///
/// Cached under `credentials:{org_id}:{user_id}` with a TTL equal to
/// `expires_in`; the cached entry is consumed on first read.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Credentials {
    pub access_token: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Access-token lifetime in seconds
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

/// A remote CRM record normalized into the uniform internal shape
///
/// Created transiently per fetched record; lives only for the duration of a
/// single fetch-and-return call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IntegrationItem {
    pub id: String,

    /// Object kind, e.g. "contact" or "deal"
    #[serde(rename = "type")]
    pub item_type: String,

    pub name: String,

    pub creation_time: Option<DateTime<Utc>>,

    pub last_modified_time: Option<DateTime<Utc>>,

    /// Never populated by HubSpot
    pub parent_id: Option<String>,

    /// Provider deep link, when the record carries an object id property
    pub url: Option<String>,

    #[serde(default = "default_visibility")]
    pub visibility: bool,
}

/// Response of the authorization initiation endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthUrlResponse {
    pub auth_url: String,
}

/// Response of the item-loading endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemsResponse {
    pub items: Vec<IntegrationItem>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_default_expires_in() {
        let creds: Credentials = serde_json::from_str(r#"{"access_token":"tok"}"#).unwrap();
        assert_eq!(creds.expires_in, 3600);
        assert!(creds.refresh_token.is_none());
    }

    #[test]
    fn test_credentials_roundtrip() {
        let creds: Credentials = serde_json::from_str(
            r#"{"access_token":"tok","refresh_token":"ref","token_type":"bearer","expires_in":1800}"#,
        )
        .unwrap();
        assert_eq!(creds.expires_in, 1800);

        let json = serde_json::to_string(&creds).unwrap();
        assert!(json.contains("\"refresh_token\":\"ref\""));
    }

    #[test]
    fn test_integration_item_serializes_type_field() {
        let item = IntegrationItem {
            id: "101".to_string(),
            item_type: "contact".to_string(),
            name: "Ada Lovelace".to_string(),
            creation_time: None,
            last_modified_time: None,
            parent_id: None,
            url: None,
            visibility: true,
        };

        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"type\":\"contact\""));
        assert!(json.contains("\"visibility\":true"));
    }
}
