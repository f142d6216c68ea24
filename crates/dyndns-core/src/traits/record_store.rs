// # Record Store Trait
//
// Defines the interface for the DNS provider's record CRUD API.
//
// ## Implementations
//
// - Cloudflare: `dyndns-provider-cloudflare` crate
//
// Stores are single-shot adapters: one API call per method, no retry, no
// caching. Retry policy is owned by the reconciler, record state by the
// reconciler's tracked record.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Record type managed by this system. Only A records are supported.
pub const RECORD_TYPE: &str = "A";

/// A DNS record as known to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned identifier. Never mutated after creation.
    pub id: String,
    /// Fully-qualified record name
    pub name: String,
    /// IPv4 address, rendered as a string
    pub content: String,
    /// Time-to-live in seconds (1 means provider-automatic)
    pub ttl: u32,
    /// Whether traffic is proxied through the provider's network
    pub proxied: bool,
    /// Free-text comment attached to the record
    pub comment: Option<String>,
}

/// Shape of a record create request. The provider assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSpec {
    /// Fully-qualified record name
    pub name: String,
    /// IPv4 address, rendered as a string
    pub content: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Whether traffic is proxied through the provider's network
    pub proxied: bool,
    /// Free-text comment attached to the record
    pub comment: Option<String>,
}

/// Trait for DNS record store implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List A records matching `name`
    ///
    /// Returns zero or one record given the single-record-per-name
    /// invariant; any further entries are ignored by the reconciler.
    async fn list(&self, name: &str) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Create a record from `spec`
    ///
    /// # Returns
    ///
    /// The created record, carrying the provider-assigned identifier.
    async fn create(&self, spec: &RecordSpec) -> Result<DnsRecord, crate::Error>;

    /// Update the content of the record with the given identifier
    ///
    /// Fails with a provider error if the identifier is unknown or the
    /// provider rejects the content.
    async fn update(&self, id: &str, content: &str) -> Result<DnsRecord, crate::Error>;

    /// Name of the backing provider, for logging
    fn store_name(&self) -> &'static str;
}
