// # Cloudflare record store
//
// Implements the `RecordStore` trait against the Cloudflare v4 REST API.
//
// ## API calls
//
// - `GET /zones?name=...` — zone id lookup, once at startup
// - `GET /zones/:zone/dns_records?type=A&name=...` — record list
// - `POST /zones/:zone/dns_records` — record create
// - `PATCH /zones/:zone/dns_records/:id` — content update
//
// No retry, no caching, no background tasks: one API call per method.
// Retry policy is owned by the reconciler.
//
// ## Security
//
// The API token never appears in logs; the `Debug` implementation redacts
// it. An empty token is rejected at construction.

use std::time::Duration;

use async_trait::async_trait;
use dyndns_core::traits::{DnsRecord, RECORD_TYPE, RecordSpec, RecordStore};
use dyndns_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Request timeout for API calls
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare-backed record store
///
/// The zone id is resolved once, at startup (see [`CloudflareStore::connect`]);
/// a zone name that cannot be resolved is fatal there.
pub struct CloudflareStore {
    /// ⚠️ never log this value
    api_token: String,
    zone_id: String,
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareStore")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .finish()
    }
}

impl CloudflareStore {
    /// Connect to the API and resolve the zone id for `zone_name`
    ///
    /// Zone resolution happens exactly once; a missing zone yields
    /// `Error::NotFound`, which the daemon treats as fatal at startup.
    pub async fn connect(api_token: impl Into<String>, zone_name: &str) -> Result<Self> {
        let mut store = Self::build(api_token.into(), String::new())?;

        let url = format!("{}/zones?name={}", CLOUDFLARE_API_BASE, zone_name);
        let body = store.send(store.client.get(&url)).await?;
        let zones: Vec<Zone> = decode(&body)?;

        let zone = zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("zone not found: {}", zone_name)))?;

        tracing::debug!(zone_id = %zone.id, zone = %zone_name, "zone resolved");
        store.zone_id = zone.id;
        Ok(store)
    }

    /// Build a store around an already-known zone id
    pub fn with_zone_id(api_token: impl Into<String>, zone_id: impl Into<String>) -> Result<Self> {
        Self::build(api_token.into(), zone_id.into())
    }

    /// The zone id this store operates on
    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    fn build(api_token: String, zone_id: String) -> Result<Self> {
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            zone_id,
            client,
        })
    }

    /// Send one authenticated request and return the response body
    ///
    /// Non-success HTTP statuses are mapped to typed errors before the body
    /// is handed to envelope decoding.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::network(format!("Cloudflare request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("failed to read Cloudflare response: {}", e)))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body));
        }

        Ok(body)
    }
}

#[async_trait]
impl RecordStore for CloudflareStore {
    async fn list(&self, name: &str) -> Result<Vec<DnsRecord>> {
        let url = format!(
            "{}/zones/{}/dns_records?type={}&name={}",
            CLOUDFLARE_API_BASE, self.zone_id, RECORD_TYPE, name
        );

        let body = self.send(self.client.get(&url)).await?;
        let records: Vec<WireRecord> = decode(&body)?;
        Ok(records.into_iter().map(DnsRecord::from).collect())
    }

    async fn create(&self, spec: &RecordSpec) -> Result<DnsRecord> {
        let url = format!("{}/zones/{}/dns_records", CLOUDFLARE_API_BASE, self.zone_id);
        let payload = CreatePayload {
            record_type: RECORD_TYPE,
            name: &spec.name,
            content: &spec.content,
            ttl: spec.ttl,
            proxied: spec.proxied,
            comment: spec.comment.as_deref(),
        };

        let body = self.send(self.client.post(&url).json(&payload)).await?;
        let record: WireRecord = decode(&body)?;
        tracing::info!(id = %record.id, name = %record.name, "DNS record created");
        Ok(record.into())
    }

    async fn update(&self, id: &str, content: &str) -> Result<DnsRecord> {
        let url = format!(
            "{}/zones/{}/dns_records/{}",
            CLOUDFLARE_API_BASE, self.zone_id, id
        );

        let body = self
            .send(self.client.patch(&url).json(&UpdatePayload { content }))
            .await?;
        let record: WireRecord = decode(&body)?;
        Ok(record.into())
    }

    fn store_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Map a non-success HTTP status to a typed error
fn status_error(status: u16, body: &str) -> Error {
    match status {
        401 | 403 => Error::provider(
            "cloudflare",
            format!(
                "authentication failed: invalid API token or insufficient permissions (HTTP {})",
                status
            ),
        ),
        404 => Error::not_found(format!("HTTP 404: {}", body)),
        429 => Error::provider("cloudflare", "rate limit exceeded, retry later"),
        500..=599 => Error::provider(
            "cloudflare",
            format!("server error (transient): HTTP {} - {}", status, body),
        ),
        _ => Error::provider("cloudflare", format!("HTTP {} - {}", status, body)),
    }
}

/// Decode a Cloudflare envelope, surfacing `success: false` errors
fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(body)
        .map_err(|e| Error::parse(format!("malformed Cloudflare response: {}", e)))?;

    if !envelope.success {
        let messages: Vec<String> = envelope
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect();
        return Err(Error::provider("cloudflare", messages.join(", ")));
    }

    envelope
        .result
        .ok_or_else(|| Error::parse("Cloudflare response missing result"))
}

// Cloudflare wire types

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Deserialize)]
struct WireRecord {
    id: String,
    name: String,
    content: String,
    #[serde(default = "automatic_ttl")]
    ttl: u32,
    #[serde(default)]
    proxied: bool,
    #[serde(default)]
    comment: Option<String>,
}

fn automatic_ttl() -> u32 {
    1
}

impl From<WireRecord> for DnsRecord {
    fn from(record: WireRecord) -> Self {
        DnsRecord {
            id: record.id,
            name: record.name,
            content: record.content,
            ttl: record.ttl,
            proxied: record.proxied,
            comment: record.comment,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatePayload<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdatePayload<'a> {
    content: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_rejected() {
        assert!(CloudflareStore::with_zone_id("", "zone123").is_err());
    }

    #[test]
    fn api_token_is_not_exposed_in_debug() {
        let store = CloudflareStore::with_zone_id("secret_token_12345", "zone123").unwrap();
        let debug_str = format!("{:?}", store);
        assert!(!debug_str.contains("secret_token"));
        assert!(debug_str.contains("CloudflareStore"));
        assert!(debug_str.contains("zone123"));
    }

    #[test]
    fn decodes_record_list() {
        let body = r#"{
            "success": true,
            "errors": [],
            "result": [
                {"id": "rec1", "type": "A", "name": "home.example.com",
                 "content": "1.2.3.4", "ttl": 1, "proxied": false,
                 "comment": "Custom DDNS"}
            ]
        }"#;

        let records: Vec<WireRecord> = decode(body).unwrap();
        assert_eq!(records.len(), 1);
        let record = DnsRecord::from(records.into_iter().next().unwrap());
        assert_eq!(record.id, "rec1");
        assert_eq!(record.content, "1.2.3.4");
        assert_eq!(record.comment.as_deref(), Some("Custom DDNS"));
    }

    #[test]
    fn decodes_empty_record_list() {
        let body = r#"{"success": true, "errors": [], "result": []}"#;
        let records: Vec<WireRecord> = decode(body).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn envelope_failure_surfaces_provider_errors() {
        let body = r#"{
            "success": false,
            "errors": [{"code": 10000, "message": "Authentication error"}],
            "result": null
        }"#;

        match decode::<Vec<WireRecord>>(body) {
            Err(Error::Provider { provider, message }) => {
                assert_eq!(provider, "cloudflare");
                assert!(message.contains("10000"));
                assert!(message.contains("Authentication error"));
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn missing_result_is_a_parse_error() {
        let body = r#"{"success": true, "errors": []}"#;
        assert!(matches!(
            decode::<WireRecord>(body),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        assert!(matches!(
            decode::<WireRecord>("<html>gateway error</html>"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(status_error(401, ""), Error::Provider { .. }));
        assert!(matches!(status_error(403, ""), Error::Provider { .. }));
        assert!(matches!(status_error(404, ""), Error::NotFound(_)));
        assert!(matches!(status_error(429, ""), Error::Provider { .. }));
        assert!(matches!(status_error(502, ""), Error::Provider { .. }));
        assert!(matches!(status_error(418, ""), Error::Provider { .. }));
    }

    #[test]
    fn wire_record_defaults() {
        let body = r#"{
            "success": true,
            "errors": [],
            "result": {"id": "rec1", "name": "home.example.com", "content": "1.2.3.4"}
        }"#;

        let record = DnsRecord::from(decode::<WireRecord>(body).unwrap());
        assert_eq!(record.ttl, 1);
        assert!(!record.proxied);
        assert!(record.comment.is_none());
    }

    #[test]
    fn create_payload_shape() {
        let payload = CreatePayload {
            record_type: RECORD_TYPE,
            name: "home.example.com",
            content: "1.2.3.4",
            ttl: 1,
            proxied: false,
            comment: Some("Custom DDNS"),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "A");
        assert_eq!(json["content"], "1.2.3.4");
        assert_eq!(json["comment"], "Custom DDNS");
    }

    #[test]
    fn create_payload_omits_absent_comment() {
        let payload = CreatePayload {
            record_type: RECORD_TYPE,
            name: "home.example.com",
            content: "1.2.3.4",
            ttl: 1,
            proxied: false,
            comment: None,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("comment").is_none());
    }
}
