//! Environment-variable configuration for the daemon
//!
//! All configuration is read from `DDNS_*` environment variables, optionally
//! pre-loaded from a `.env` file next to the binary's working directory.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use dyndns_core::config::{RecordConfig, RetryConfig, UpdaterConfig, validate_domain_name};
use dyndns_ip_http::DEFAULT_LOOKUP_URL;

/// Optional dotenv file, loaded before anything reads the environment
const ENV_FILE_PATH: &str = ".env";

/// Default health endpoint port
const DEFAULT_HEALTH_PORT: u16 = 8080;

/// Load the optional `.env` file into the process environment
///
/// Variables already present in the environment win over file entries.
/// A missing file is not an error.
pub fn load_env_file() {
    if Path::new(ENV_FILE_PATH).exists() {
        if let Err(e) = dotenvy::from_path(ENV_FILE_PATH) {
            eprintln!("WARNING: failed to load {}: {}", ENV_FILE_PATH, e);
        }
    }
}

/// Daemon configuration
///
/// | Variable                | Required | Default                   |
/// |-------------------------|----------|---------------------------|
/// | `DDNS_API_TOKEN`        | yes      |                           |
/// | `DDNS_ZONE_NAME`        | yes      |                           |
/// | `DDNS_RECORD_NAME`      | yes      |                           |
/// | `DDNS_SCHEDULE`         | yes      |                           |
/// | `DDNS_RECORD_TTL`       | no       | `1` (automatic)           |
/// | `DDNS_RECORD_PROXIED`   | no       | `false`                   |
/// | `DDNS_RECORD_COMMENT`   | no       | `Custom DDNS`             |
/// | `DDNS_LOOKUP_URL`       | no       | `http://ip-api.com/json/` |
/// | `DDNS_HEALTH_PORT`      | no       | `8080`                    |
/// | `DDNS_MAX_RETRIES`      | no       | `3`                       |
/// | `DDNS_RETRY_DELAY_SECS` | no       | `5`                       |
/// | `DDNS_LOG_LEVEL`        | no       | `info`                    |
pub struct Config {
    pub api_token: String,
    pub zone_name: String,
    pub record_name: String,
    pub schedule: String,
    pub record_ttl: u32,
    pub record_proxied: bool,
    pub record_comment: Option<String>,
    pub lookup_url: String,
    pub health_port: u16,
    pub max_retries: usize,
    pub retry_delay_secs: u64,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_token: require("DDNS_API_TOKEN")?,
            zone_name: require("DDNS_ZONE_NAME")?,
            record_name: require("DDNS_RECORD_NAME")?,
            schedule: require("DDNS_SCHEDULE")?,
            record_ttl: parse_or("DDNS_RECORD_TTL", 1)?,
            record_proxied: parse_or("DDNS_RECORD_PROXIED", false)?,
            record_comment: match std::env::var("DDNS_RECORD_COMMENT") {
                Ok(comment) if comment.is_empty() => None,
                Ok(comment) => Some(comment),
                Err(_) => Some(dyndns_core::config::DEFAULT_RECORD_COMMENT.to_string()),
            },
            lookup_url: std::env::var("DDNS_LOOKUP_URL")
                .unwrap_or_else(|_| DEFAULT_LOOKUP_URL.to_string()),
            health_port: parse_or("DDNS_HEALTH_PORT", DEFAULT_HEALTH_PORT)?,
            max_retries: parse_or("DDNS_MAX_RETRIES", 3)?,
            retry_delay_secs: parse_or("DDNS_RETRY_DELAY_SECS", 5)?,
            log_level: std::env::var("DDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration and build the updater settings from it
    pub fn validate(&self) -> Result<UpdaterConfig> {
        if self.api_token.is_empty() {
            anyhow::bail!(
                "DDNS_API_TOKEN is required. \
                Set it via: export DDNS_API_TOKEN=your_token"
            );
        }

        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower.contains("example")
            || token_lower == "token"
        {
            anyhow::bail!(
                "DDNS_API_TOKEN appears to be a placeholder. \
                Use an actual API token from your DNS provider."
            );
        }

        validate_domain_name(&self.zone_name)
            .with_context(|| format!("DDNS_ZONE_NAME '{}' is not valid", self.zone_name))?;

        if !self.record_name.ends_with(&self.zone_name) {
            anyhow::bail!(
                "DDNS_RECORD_NAME '{}' does not belong to zone '{}'",
                self.record_name,
                self.zone_name
            );
        }

        if !(1..=300).contains(&self.retry_delay_secs) {
            anyhow::bail!(
                "DDNS_RETRY_DELAY_SECS must be between 1 and 300 seconds. Got: {}",
                self.retry_delay_secs
            );
        }

        if self.max_retries > 10 {
            anyhow::bail!(
                "DDNS_MAX_RETRIES must be at most 10. Got: {}",
                self.max_retries
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        let updater = UpdaterConfig {
            record: RecordConfig {
                name: self.record_name.clone(),
                ttl: self.record_ttl,
                proxied: self.record_proxied,
                comment: self.record_comment.clone(),
            },
            schedule: self.schedule.clone(),
            retry: RetryConfig {
                max_retries: self.max_retries,
                retry_delay_secs: self.retry_delay_secs,
            },
        };
        updater.validate()?;
        Ok(updater)
    }
}

/// Read a required environment variable with a guidance message
fn require(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| {
        format!(
            "{} is required. Set it via: export {}=<value>",
            name, name
        )
    })
}

/// Read an optional environment variable, parsing it into `T`
fn parse_or<T: FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", name, value, e)),
        Err(_) => Ok(default),
    }
}
