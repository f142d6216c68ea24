// # HTTP public-IP resolver
//
// Resolves the caller's public IPv4 address by querying an ip-api.com-style
// lookup service that answers with `{"query": "<ip>"}`-shaped JSON.
//
// One request per call, no retry; retry policy is owned by the reconciler.
//
// ## Error mapping
//
// - request failure or non-2xx status -> `Error::Network`
// - body that is not valid JSON -> `Error::Parse`
// - JSON without the address field, or a non-IPv4 value -> `Error::Parse`
//
// The last case deliberately diverges from lookup clients that fall back to
// an empty string when the field is missing: an empty address would only
// defer the failure to the provider call.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use dyndns_core::traits::IpResolver;
use dyndns_core::{Error, Result};
use serde::Deserialize;

/// Default lookup endpoint
pub const DEFAULT_LOOKUP_URL: &str = "http://ip-api.com/json/";

/// Request timeout for lookups
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Shape of the lookup service's JSON response. Only the address field is
/// read; everything else the service returns is ignored.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    query: String,
}

/// Public-IP resolver backed by an HTTP lookup service
pub struct IpApiResolver {
    url: String,
    client: reqwest::Client,
}

impl IpApiResolver {
    /// Create a resolver against the given lookup endpoint
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(LOOKUP_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// The lookup endpoint this resolver queries
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for IpApiResolver {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_URL)
    }
}

/// Parse a lookup response body into an IPv4 address
fn parse_lookup_body(body: &str) -> Result<Ipv4Addr> {
    let response: LookupResponse = serde_json::from_str(body)
        .map_err(|e| Error::parse(format!("unexpected lookup response: {}", e)))?;

    response.query.parse().map_err(|_| {
        Error::parse(format!(
            "lookup returned a non-IPv4 address: '{}'",
            response.query
        ))
    })
}

#[async_trait]
impl IpResolver for IpApiResolver {
    async fn public_ipv4(&self) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("IP lookup request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "IP lookup returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("failed to read lookup response: {}", e)))?;

        let ip = parse_lookup_body(&body)?;
        tracing::debug!(%ip, "public IP resolved");
        Ok(ip)
    }

    fn resolver_name(&self) -> &'static str {
        "ip-api"
    }
}
