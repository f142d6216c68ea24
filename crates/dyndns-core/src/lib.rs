// # dyndns-core
//
// Core library for the dynamic DNS updater.
//
// The updater is a periodic reconciliation loop: resolve the machine's
// current public IPv4 address, compare it to the DNS record tracked in
// memory, and push an update to the provider when they differ.
//
// ## Components
//
// - **IpResolver**: trait for public-IP lookup (one request per call)
// - **RecordStore**: trait wrapping the provider's record CRUD API
// - **Reconciler**: two-state machine holding the tracked record
// - **Scheduler**: drives the reconciler on a cron or fixed-interval schedule
//
// ## Error policy
//
// Startup errors (configuration, zone resolution, first reconciliation)
// propagate out of the scheduler and are fatal to the process. Errors inside
// a scheduled tick are logged and confined to that tick; the next tick runs
// as scheduled.

pub mod config;
pub mod error;
pub mod reconciler;
pub mod scheduler;
pub mod traits;

// Re-export core types for convenience
pub use config::{RecordConfig, RetryConfig, UpdaterConfig};
pub use error::{Error, Result};
pub use reconciler::{Reconciler, ReconcilerState, TickOutcome};
pub use scheduler::{Schedule, Scheduler, SchedulerEvent};
pub use traits::{DnsRecord, IpResolver, RecordSpec, RecordStore};
