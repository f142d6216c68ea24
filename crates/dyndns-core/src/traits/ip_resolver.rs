// # IP Resolver Trait
//
// Defines the interface for discovering the machine's current public
// IPv4 address.
//
// ## Implementations
//
// - HTTP lookup service: `dyndns-ip-http` crate

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for public-IP resolvers
///
/// Implementations issue a single outbound request per call and never
/// retry; retry policy is owned by the reconciler. Implementations must be
/// thread-safe and usable across async tasks.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Fetch the caller's current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: the observed address
    /// - `Err(Error::Network)`: the request could not complete
    /// - `Err(Error::Parse)`: the response body was malformed
    async fn public_ipv4(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Name of the resolver, for logging
    fn resolver_name(&self) -> &'static str;
}
