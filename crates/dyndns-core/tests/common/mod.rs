//! Test doubles and common utilities for reconciler and scheduler tests

use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dyndns_core::config::{RecordConfig, RetryConfig};
use dyndns_core::error::{Error, Result};
use dyndns_core::traits::{DnsRecord, IpResolver, RecordSpec, RecordStore};

/// One scripted resolver observation
#[derive(Debug, Clone)]
pub enum Observation {
    /// Resolution succeeds with this address
    Ip(Ipv4Addr),
    /// Resolution fails with a network error
    Fail(&'static str),
}

/// Resolver that replays a scripted sequence of observations, repeating the
/// final entry once the script is exhausted
pub struct ScriptedResolver {
    script: Mutex<VecDeque<Observation>>,
    last: Mutex<Option<Observation>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn new(script: impl IntoIterator<Item = Observation>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(None),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Convenience constructor from dotted-quad strings
    pub fn ips(addrs: &[&str]) -> Self {
        Self::new(
            addrs
                .iter()
                .map(|a| Observation::Ip(a.parse().expect("test address must be valid IPv4")))
                .collect::<Vec<_>>(),
        )
    }

}

#[async_trait]
impl IpResolver for ScriptedResolver {
    async fn public_ipv4(&self) -> Result<Ipv4Addr> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().unwrap().pop_front();
        let observation = match next {
            Some(observation) => {
                *self.last.lock().unwrap() = Some(observation.clone());
                observation
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .expect("scripted resolver needs at least one observation"),
        };

        match observation {
            Observation::Ip(ip) => Ok(ip),
            Observation::Fail(msg) => Err(Error::network(msg)),
        }
    }

    fn resolver_name(&self) -> &'static str {
        "scripted"
    }
}

/// In-memory record store that counts calls and can script update failures
///
/// Clones share all state and counters, so a test can keep one handle while
/// boxing another into the reconciler.
pub struct MockRecordStore {
    records: Arc<Mutex<Vec<DnsRecord>>>,
    list_calls: Arc<AtomicUsize>,
    create_calls: Arc<AtomicUsize>,
    update_calls: Arc<AtomicUsize>,
    updates: Arc<Mutex<Vec<(String, String)>>>,
    fail_updates: Arc<AtomicUsize>,
    next_id: Arc<AtomicUsize>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            list_calls: Arc::new(AtomicUsize::new(0)),
            create_calls: Arc::new(AtomicUsize::new(0)),
            update_calls: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(Mutex::new(Vec::new())),
            fail_updates: Arc::new(AtomicUsize::new(0)),
            next_id: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Store pre-seeded with one provider-side record
    pub fn seeded(record: DnsRecord) -> Self {
        let store = Self::new();
        store.records.lock().unwrap().push(record);
        store
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// (id, content) pairs of successful updates, in call order
    pub fn updates(&self) -> Vec<(String, String)> {
        self.updates.lock().unwrap().clone()
    }

    /// Make the next `n` update calls fail with a provider error
    pub fn fail_next_updates(&self, n: usize) {
        self.fail_updates.store(n, Ordering::SeqCst);
    }
}

impl Clone for MockRecordStore {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            list_calls: Arc::clone(&self.list_calls),
            create_calls: Arc::clone(&self.create_calls),
            update_calls: Arc::clone(&self.update_calls),
            updates: Arc::clone(&self.updates),
            fail_updates: Arc::clone(&self.fail_updates),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn list(&self, name: &str) -> Result<Vec<DnsRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.name == name)
            .cloned()
            .collect())
    }

    async fn create(&self, spec: &RecordSpec) -> Result<DnsRecord> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let record = DnsRecord {
            id,
            name: spec.name.clone(),
            content: spec.content.clone(),
            ttl: spec.ttl,
            proxied: spec.proxied,
            comment: spec.comment.clone(),
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, content: &str) -> Result<DnsRecord> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_updates.load(Ordering::SeqCst) > 0 {
            self.fail_updates.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::provider("mock", "scripted update failure"));
        }

        self.updates
            .lock()
            .unwrap()
            .push((id.to_string(), content.to_string()));

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::not_found(format!("record {}", id)))?;
        record.content = content.to_string();
        Ok(record.clone())
    }

    fn store_name(&self) -> &'static str {
        "mock"
    }
}

/// A provider-side record as it would exist before the updater starts
pub fn provider_record(id: &str, name: &str, content: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        name: name.to_string(),
        content: content.to_string(),
        ttl: 1,
        proxied: false,
        comment: Some("Custom DDNS".to_string()),
    }
}

/// Retry settings with no delay, for fast tests
pub fn fast_retry(max_retries: usize) -> RetryConfig {
    RetryConfig {
        max_retries,
        retry_delay_secs: 0,
    }
}

/// Record configuration for the conventional test hostname
pub fn test_record_config() -> RecordConfig {
    RecordConfig::new("home.example.com")
}
