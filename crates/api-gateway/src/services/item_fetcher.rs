//! Paginated CRM record retrieval and normalization
//!
//! Pulls contacts and deals from the HubSpot object-listing endpoints with
//! cursor-based pagination and maps every raw record into an
//! `IntegrationItem`. Contacts are the primary kind: a failure there fails
//! the whole fetch. Deals degrade gracefully to an empty set. A single
//! malformed record never aborts the batch; it is replaced by a minimal
//! placeholder item.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::models::{Credentials, IntegrationItem, ItemsResponse};
use crate::services::oauth_error::OAuthFlowError;

/// Page size requested from the listing endpoints
const PAGE_LIMIT: u32 = 50;

/// Upper bound on pages per object kind, guarding against a misbehaving or
/// cycling provider cursor
const MAX_PAGES: u32 = 20;

const CONTACT_PROPERTIES: &str = "firstname,lastname,email,phone,company,website,hs_object_id";
const DEAL_PROPERTIES: &str = "dealname,amount,closedate,dealstage,pipeline";

/// One page of a HubSpot object listing
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<Value>,
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    next: Option<PagingNext>,
}

#[derive(Debug, Deserialize)]
struct PagingNext {
    after: Option<String>,
}

/// Fetches CRM records and normalizes them into `IntegrationItem`s
#[derive(Clone)]
pub struct HubSpotItemFetcher {
    api_base_url: String,
    http_client: reqwest::Client,
}

impl HubSpotItemFetcher {
    pub fn new(api_base_url: String) -> Self {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_base_url,
            http_client,
        }
    }

    /// Fetch contacts and deals and return the normalized item sequence
    ///
    /// `raw_credentials` is whatever the caller got back from the credentials
    /// endpoint; it is validated here rather than trusted.
    pub async fn fetch_items(&self, raw_credentials: &Value) -> Result<ItemsResponse, OAuthFlowError> {
        let credentials = parse_credentials(raw_credentials)?;
        let access_token = credentials.access_token.trim().to_string();
        if access_token.is_empty() {
            return Err(OAuthFlowError::MalformedCredentials(
                "No access token found in credentials".to_string(),
            ));
        }

        let contacts = self
            .list_objects(&access_token, "contacts", CONTACT_PROPERTIES)
            .await?;

        let deals = match self
            .list_objects(&access_token, "deals", DEAL_PROPERTIES)
            .await
        {
            Ok(deals) => deals,
            Err(e) => {
                // Secondary object kind: partial success, not fatal
                tracing::warn!(error = %e, "Failed to fetch deals, continuing with contacts only");
                Vec::new()
            }
        };

        let mut items = Vec::with_capacity(contacts.len() + deals.len());
        for (records, object_type) in [(contacts, "contact"), (deals, "deal")] {
            for record in records {
                match map_record(&record, object_type) {
                    Ok(item) => items.push(item),
                    Err(e) => {
                        tracing::warn!(
                            object_type,
                            error = %e,
                            "Failed to map record, substituting placeholder"
                        );
                        items.push(placeholder_item(&record));
                    }
                }
            }
        }

        tracing::info!(count = items.len(), "Normalized HubSpot records");

        Ok(ItemsResponse {
            count: items.len(),
            items,
        })
    }

    /// Retrieve every page of one object kind
    ///
    /// Strictly sequential: each page's cursor comes from the prior response.
    async fn list_objects(
        &self,
        access_token: &str,
        kind: &'static str,
        properties: &str,
    ) -> Result<Vec<Value>, OAuthFlowError> {
        let url = format!("{}/crm/v3/objects/{}", self.api_base_url, kind);
        let mut results = Vec::new();
        let mut after: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let mut request = self
                .http_client
                .get(&url)
                .bearer_auth(access_token)
                .query(&[
                    ("limit", PAGE_LIMIT.to_string().as_str()),
                    ("properties", properties),
                ]);
            if let Some(cursor) = &after {
                request = request.query(&[("after", cursor.as_str())]);
            }

            let response = request.send().await.map_err(|e| {
                OAuthFlowError::FetchFailed(format!("{}: request failed: {}", kind, e))
            })?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(OAuthFlowError::FetchFailed(format!(
                    "{}: HTTP {}: {}",
                    kind, status, body
                )));
            }

            let page: ListResponse = response.json().await.map_err(|e| {
                OAuthFlowError::FetchFailed(format!("{}: invalid JSON: {}", kind, e))
            })?;

            results.extend(page.results);
            pages += 1;

            match page.paging.and_then(|p| p.next).and_then(|n| n.after) {
                Some(cursor) => {
                    if after.as_deref() == Some(cursor.as_str()) {
                        tracing::warn!(kind, cursor = %cursor, "Provider repeated a pagination cursor, stopping");
                        break;
                    }
                    if pages >= MAX_PAGES {
                        tracing::warn!(kind, pages, "Page bound reached, results may be truncated");
                        break;
                    }
                    after = Some(cursor);
                }
                None => break,
            }
        }

        tracing::debug!(kind, pages, count = results.len(), "Fetched object listing");

        Ok(results)
    }
}

/// Accept the credential shapes callers actually send: a credentials object,
/// a double-encoded JSON string, or an envelope with a `credentials` field
fn parse_credentials(raw: &Value) -> Result<Credentials, OAuthFlowError> {
    let value = match raw {
        Value::String(inner) => serde_json::from_str::<Value>(inner).map_err(|e| {
            OAuthFlowError::MalformedCredentials(format!("Invalid credentials format: {}", e))
        })?,
        other => other.clone(),
    };

    let value = match value.get("credentials") {
        Some(nested) if nested.is_object() => nested.clone(),
        _ => value,
    };

    serde_json::from_value(value).map_err(|e| {
        OAuthFlowError::MalformedCredentials(format!("Invalid credentials format: {}", e))
    })
}

/// Map one raw record into an `IntegrationItem`
///
/// The error branch is explicit so the skip-bad-record policy stays a
/// testable decision of the fetch loop rather than implicit control flow.
fn map_record(record: &Value, object_type: &str) -> anyhow::Result<IntegrationItem> {
    let id = record_id(record).ok_or_else(|| anyhow::anyhow!("record has no usable id"))?;

    let properties = match record.get("properties") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(_) => anyhow::bail!("properties is not an object"),
    };

    let url = properties
        .and_then(|p| p.get("hs_object_id"))
        .and_then(Value::as_str)
        .filter(|object_id| !object_id.is_empty())
        .map(|object_id| format!("https://app.hubspot.com/contacts/{}", object_id));

    Ok(IntegrationItem {
        id,
        item_type: object_type.to_string(),
        name: display_name(properties, object_type),
        creation_time: parse_time(record, "createdAt"),
        last_modified_time: parse_time(record, "updatedAt"),
        // HubSpot has no parent/child containment for these kinds
        parent_id: None,
        url,
        visibility: true,
    })
}

/// Minimal substitute for a record that failed to map, preserving the id
/// when the raw record carried one
fn placeholder_item(record: &Value) -> IntegrationItem {
    IntegrationItem {
        id: record_id(record).unwrap_or_else(|| "unknown".to_string()),
        item_type: "contact".to_string(),
        name: "Error processing contact".to_string(),
        creation_time: None,
        last_modified_time: None,
        parent_id: None,
        url: None,
        visibility: true,
    }
}

fn record_id(record: &Value) -> Option<String> {
    match record.get("id") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn display_name(
    properties: Option<&serde_json::Map<String, Value>>,
    object_type: &str,
) -> String {
    let prop = |key: &str| {
        properties
            .and_then(|p| p.get(key))
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
    };

    if object_type == "deal" {
        let dealname = prop("dealname");
        if dealname.is_empty() {
            "Unnamed Deal".to_string()
        } else {
            dealname.to_string()
        }
    } else {
        let full_name = format!("{} {}", prop("firstname"), prop("lastname"))
            .trim()
            .to_string();
        if full_name.is_empty() {
            "Unnamed Contact".to_string()
        } else {
            full_name
        }
    }
}

/// Parse an ISO-8601 timestamp with a trailing `Z` treated as UTC
///
/// Absent or unparsable values yield `None` rather than failing the record.
fn parse_time(record: &Value, key: &str) -> Option<DateTime<Utc>> {
    record
        .get(key)
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
