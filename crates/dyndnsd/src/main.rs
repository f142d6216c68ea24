// # dyndnsd - Dynamic DNS daemon
//
// Keeps a single DNS A record pointed at this host's public IPv4 address.
// On a schedule it resolves the public IP through an HTTP lookup service
// and updates the record at the DNS provider when the address changed.
//
// This binary is a thin integration layer: reconciliation, scheduling, and
// retry logic live in dyndns-core; provider and lookup specifics live in
// dyndns-provider-cloudflare and dyndns-ip-http.
//
// ## Configuration
//
// All configuration is done via environment variables, optionally loaded
// from a `.env` file in the working directory (see `config.rs` for the
// full table):
//
// ```bash
// export DDNS_API_TOKEN=your_token
// export DDNS_ZONE_NAME=example.com
// export DDNS_RECORD_NAME=home.example.com
// export DDNS_SCHEDULE="0 */5 * * * *"   # cron, or plain seconds: "300"
//
// dyndnsd
// ```
//
// A liveness endpoint answers on `GET /health` (port 8080 by default).

use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use dyndns_core::{Reconciler, Schedule, Scheduler};
use dyndns_ip_http::IpApiResolver;
use dyndns_provider_cloudflare::CloudflareStore;

mod config;
mod health;

use config::Config;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load the optional .env file before anything reads the environment
    config::load_env_file();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    let updater = match config.validate() {
        Ok(updater) => updater,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting dyndnsd daemon");
    info!(
        record = %config.record_name,
        zone = %config.zone_name,
        schedule = %config.schedule,
        "Configuration loaded"
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config, updater).await {
            error!("Daemon error: {:#}", e);
            DaemonExitCode::RuntimeError
        } else {
            DaemonExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config, updater: dyndns_core::UpdaterConfig) -> Result<()> {
    // The health endpoint only reflects process liveness; it stays up
    // regardless of reconciliation failures.
    let health_port = config.health_port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(health_port).await {
            error!("Health endpoint error: {:#}", e);
        }
    });

    let resolver = IpApiResolver::new(&config.lookup_url);
    info!(url = %resolver.url(), "IP lookup configured");

    let store = CloudflareStore::connect(&config.api_token, &config.zone_name)
        .await
        .with_context(|| format!("failed to resolve zone '{}'", config.zone_name))?;
    info!(zone_id = %store.zone_id(), "DNS provider connected");

    let reconciler = Reconciler::new(
        Box::new(resolver),
        Box::new(store),
        updater.record,
        updater.retry,
    );

    // Already validated; parse cannot fail here
    let schedule = Schedule::from_str(&config.schedule)
        .with_context(|| format!("invalid schedule '{}'", config.schedule))?;

    let (mut scheduler, mut events) = Scheduler::new(reconciler, schedule);

    // The scheduler logs every transition itself; this drain keeps the
    // event channel from filling up.
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::trace!(?event, "scheduler event");
        }
    });

    scheduler.run().await.context("scheduler failed")?;

    info!("Shutting down daemon");
    Ok(())
}
