//! Reconciliation of the managed DNS record against the observed public IP
//!
//! The reconciler is a two-state machine:
//!
//! ```text
//! Uninitialized ──initialize()──▶ Tracking ──tick()──▶ Tracking
//! ```
//!
//! `initialize` runs once at process start: it resolves the current IP and
//! either adopts the provider's existing record or creates one. Every
//! scheduled tick then re-resolves the IP and updates the provider when it
//! differs from the tracked record's content. The state never reverts to
//! `Uninitialized`.
//!
//! The tracked record is exclusively owned here; ticks never overlap (see
//! [`crate::scheduler`]), so no locking is needed.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{RecordConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::traits::{DnsRecord, IpResolver, RecordStore};

/// Lifecycle of the reconciler
#[derive(Debug)]
pub enum ReconcilerState {
    /// No record held yet; `initialize` has not run
    Uninitialized,
    /// Holding the managed record. Only its content mutates, never its id.
    Tracking(DnsRecord),
}

/// What a startup or tick pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No record existed; one was created with the observed IP
    Created(DnsRecord),
    /// An existing record was adopted as-is. Its content is not compared to
    /// the observed IP during adoption; the first tick converges it.
    Adopted(DnsRecord),
    /// The record content was updated to the observed IP
    Updated {
        /// Content before the update
        previous: String,
        /// The record as returned by the provider
        record: DnsRecord,
    },
    /// Observed IP already matches the record; nothing to do
    Unchanged {
        /// The observed (and recorded) content
        content: String,
    },
}

/// Reconciler holding the tracked record
pub struct Reconciler {
    resolver: Box<dyn IpResolver>,
    store: Box<dyn RecordStore>,
    record: RecordConfig,
    retry: RetryConfig,
    state: ReconcilerState,
}

impl Reconciler {
    /// Create a reconciler in the `Uninitialized` state
    pub fn new(
        resolver: Box<dyn IpResolver>,
        store: Box<dyn RecordStore>,
        record: RecordConfig,
        retry: RetryConfig,
    ) -> Self {
        Self {
            resolver,
            store,
            record,
            retry,
            state: ReconcilerState::Uninitialized,
        }
    }

    /// Name of the managed record
    pub fn record_name(&self) -> &str {
        &self.record.name
    }

    /// The currently tracked record, if `initialize` has run
    pub fn tracked(&self) -> Option<&DnsRecord> {
        match &self.state {
            ReconcilerState::Tracking(record) => Some(record),
            ReconcilerState::Uninitialized => None,
        }
    }

    /// Startup transition: resolve the current IP and either adopt the
    /// provider's existing record or create one.
    ///
    /// Errors here are fatal to the caller; a process that cannot complete
    /// its first reconciliation has nothing useful to do.
    pub async fn initialize(&mut self) -> Result<TickOutcome> {
        if let ReconcilerState::Tracking(record) = &self.state {
            return Err(Error::config(format!(
                "initialize called twice (already tracking record {})",
                record.id
            )));
        }

        let ip = self.resolver.public_ipv4().await?;
        info!(
            resolver = self.resolver.resolver_name(),
            %ip,
            "initial public IP resolved"
        );

        let existing = self.store.list(&self.record.name).await?;
        let (record, outcome) = match existing.into_iter().next() {
            Some(record) => {
                debug!(id = %record.id, content = %record.content, "adopting existing record");
                (record.clone(), TickOutcome::Adopted(record))
            }
            None => {
                let spec = self.record.spec(&ip.to_string());
                let record = self.store.create(&spec).await?;
                (record.clone(), TickOutcome::Created(record))
            }
        };

        self.state = ReconcilerState::Tracking(record);
        Ok(outcome)
    }

    /// One reconciliation pass: compare the observed IP to the tracked
    /// record and update the provider on mismatch.
    ///
    /// On a successful update the tracked record is replaced with the
    /// provider's response; its identifier is carried over unchanged.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        let ip = self.resolver.public_ipv4().await?;
        let observed = ip.to_string();

        let (id, previous) = match &self.state {
            ReconcilerState::Tracking(record) => {
                if record.content == observed {
                    debug!(content = %observed, "record already current");
                    return Ok(TickOutcome::Unchanged { content: observed });
                }
                (record.id.clone(), record.content.clone())
            }
            ReconcilerState::Uninitialized => {
                return Err(Error::config("tick invoked before initialize"));
            }
        };

        let updated = self.update_with_retry(&id, &observed).await?;
        self.state = ReconcilerState::Tracking(updated.clone());
        Ok(TickOutcome::Updated {
            previous,
            record: updated,
        })
    }

    /// Update through the store with a bounded number of attempts
    ///
    /// Retry lives here rather than in the store so a single policy governs
    /// every provider. One initial attempt plus `max_retries` retries, with
    /// a fixed delay between attempts.
    async fn update_with_retry(&self, id: &str, content: &str) -> Result<DnsRecord> {
        let mut last_error = None;
        for attempt in 0..=self.retry.max_retries {
            match self.store.update(id, content).await {
                Ok(record) => return Ok(record),
                Err(e) => {
                    warn!(
                        attempt,
                        store = self.store.store_name(),
                        "update attempt failed: {}",
                        e
                    );
                    last_error = Some(e);
                    if attempt < self.retry.max_retries {
                        tokio::time::sleep(Duration::from_secs(self.retry.retry_delay_secs)).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::network("update failed before any attempt was made")))
    }
}
