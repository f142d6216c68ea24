//! Trait seams between the core and its external collaborators.
//!
//! The reconciler only ever talks to a [`IpResolver`] and a [`RecordStore`];
//! concrete implementations live in their own crates.

pub mod ip_resolver;
pub mod record_store;

pub use ip_resolver::IpResolver;
pub use record_store::{DnsRecord, RECORD_TYPE, RecordSpec, RecordStore};
