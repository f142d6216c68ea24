//! Configuration types for the updater
//!
//! This module defines the configuration structures consumed by the
//! reconciler and scheduler. How the values are sourced (environment
//! variables, `.env` file) is the daemon's concern.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default record comment attached on creation
pub const DEFAULT_RECORD_COMMENT: &str = "Custom DDNS";

/// Main updater configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// The managed record
    pub record: RecordConfig,

    /// Schedule expression: an integer number of seconds or a cron
    /// expression (see [`crate::scheduler::Schedule`])
    pub schedule: String,

    /// Tick-level retry settings
    #[serde(default)]
    pub retry: RetryConfig,
}

impl UpdaterConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.record.validate()?;
        crate::scheduler::Schedule::from_str(&self.schedule)?;
        Ok(())
    }
}

/// Configuration of the single managed A record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Fully-qualified record name (e.g., "home.example.com")
    pub name: String,

    /// Time-to-live in seconds. 1 means provider-automatic.
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Whether traffic is proxied through the provider's network.
    /// Disabled by default; proxying off exposes the origin IP.
    #[serde(default)]
    pub proxied: bool,

    /// Free-text comment attached on creation
    #[serde(default = "default_comment")]
    pub comment: Option<String>,
}

impl RecordConfig {
    /// Create a record configuration with defaults
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ttl: default_ttl(),
            proxied: false,
            comment: default_comment(),
        }
    }

    /// Build the create-request shape for this record with the given content
    pub fn spec(&self, content: &str) -> crate::traits::RecordSpec {
        crate::traits::RecordSpec {
            name: self.name.clone(),
            content: content.to_string(),
            ttl: self.ttl,
            proxied: self.proxied,
            comment: self.comment.clone(),
        }
    }

    /// Validate the record configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_domain_name(&self.name)
    }
}

fn default_ttl() -> u32 {
    1
}

fn default_comment() -> Option<String> {
    Some(DEFAULT_RECORD_COMMENT.to_string())
}

/// Tick-level retry settings for record updates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retry attempts after the initial update attempt fails
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Delay between attempts (in seconds)
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

/// Validate that a string is a valid domain name
///
/// Basic DNS domain name validation per RFC 1035. Not comprehensive, but
/// catches common configuration mistakes before any network call is made.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config("domain name cannot be empty"));
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "domain name too long: {} chars (max 253)",
            domain.len()
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "domain label too long: {} chars (max 63): '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "domain label contains invalid characters: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "domain label cannot start or end with hyphen: '{}'",
                label
            )));
        }
    }

    Ok(())
}
