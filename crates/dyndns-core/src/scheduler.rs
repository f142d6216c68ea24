//! Tick scheduling for the reconciler
//!
//! The scheduler runs the startup transition once, then invokes the
//! reconciler's tick on a recurring schedule. Ticks are awaited inline, so
//! they never overlap: a hung network call delays the next tick but cannot
//! duplicate it.
//!
//! Error policy: startup errors propagate to the caller (fatal); tick
//! errors are logged, emitted as [`SchedulerEvent::TickFailed`], and the
//! loop continues with the next tick.

use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::reconciler::{Reconciler, TickOutcome};

/// Capacity of the event channel. When full, events are dropped with a
/// warning rather than blocking the tick.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Fallback delay when a cron schedule has no upcoming firing
const CRON_IDLE_DELAY: Duration = Duration::from_secs(60);

/// When the reconciliation tick fires
#[derive(Debug, Clone)]
pub enum Schedule {
    /// Fixed interval between ticks
    Every(Duration),
    /// Cron expression, evaluated in UTC
    Cron(Box<cron::Schedule>),
}

impl Schedule {
    /// Time to sleep before the next tick fires
    pub fn next_delay(&self) -> Duration {
        match self {
            Schedule::Every(interval) => *interval,
            Schedule::Cron(schedule) => match schedule.upcoming(Utc).next() {
                Some(next) => (next - Utc::now()).to_std().unwrap_or(Duration::ZERO),
                None => CRON_IDLE_DELAY,
            },
        }
    }
}

impl FromStr for Schedule {
    type Err = Error;

    /// Parse a schedule expression: a plain integer is a fixed interval in
    /// seconds, anything else must be a valid cron expression.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::config("schedule expression cannot be empty"));
        }

        if let Ok(secs) = s.parse::<u64>() {
            if secs == 0 {
                return Err(Error::config("schedule interval must be greater than zero"));
            }
            return Ok(Schedule::Every(Duration::from_secs(secs)));
        }

        let schedule = cron::Schedule::from_str(s).map_err(|e| {
            Error::config(format!("invalid schedule expression '{}': {}", s, e))
        })?;
        Ok(Schedule::Cron(Box::new(schedule)))
    }
}

/// Events emitted by the scheduler for external monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Scheduler started
    Started {
        /// Name of the managed record
        record_name: String,
    },

    /// Startup found no record and created one
    RecordCreated {
        /// Provider-assigned identifier
        id: String,
        /// Record content (observed IP)
        content: String,
    },

    /// Startup adopted the provider's existing record as-is
    RecordAdopted {
        /// Provider-assigned identifier
        id: String,
        /// Record content at adoption time
        content: String,
    },

    /// A tick updated the record
    Updated {
        /// Provider-assigned identifier
        id: String,
        /// Content before the update
        previous: String,
        /// Content after the update
        new: String,
    },

    /// A tick found the record already current
    Unchanged {
        /// The observed content
        content: String,
    },

    /// A tick failed; the loop continues
    TickFailed {
        /// Rendered error
        error: String,
    },

    /// Scheduler stopped
    Stopped {
        /// Why the loop exited
        reason: String,
    },
}

/// Scheduler driving the reconciler
pub struct Scheduler {
    reconciler: Reconciler,
    schedule: Schedule,
    event_tx: mpsc::Sender<SchedulerEvent>,
}

impl Scheduler {
    /// Create a scheduler around a reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (scheduler, event_receiver) where the receiver yields
    /// [`SchedulerEvent`]s for logging or monitoring.
    pub fn new(
        reconciler: Reconciler,
        schedule: Schedule,
    ) -> (Self, mpsc::Receiver<SchedulerEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        (
            Self {
                reconciler,
                schedule,
                event_tx: tx,
            },
            rx,
        )
    }

    /// Run the scheduler until a shutdown signal (ctrl-c) is received
    ///
    /// The startup transition runs first; its errors are fatal and
    /// propagate to the caller.
    pub async fn run(&mut self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run with a programmatic shutdown signal
    ///
    /// Used by tests that need deterministic shutdown; production code
    /// should use [`Scheduler::run`], which listens for OS signals.
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&mut self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.emit(SchedulerEvent::Started {
            record_name: self.reconciler.record_name().to_string(),
        });

        // Startup transition: create or adopt the record
        let outcome = self.reconciler.initialize().await?;
        self.report(outcome);

        if let Some(mut rx) = shutdown_rx {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(self.schedule.next_delay()) => {
                        self.run_tick().await;
                    }

                    _ = &mut rx => {
                        info!("shutdown signal received");
                        self.emit(SchedulerEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        } else {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(self.schedule.next_delay()) => {
                        self.run_tick().await;
                    }

                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown signal received");
                        self.emit(SchedulerEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Run one tick. Awaited to completion here, so ticks never overlap.
    async fn run_tick(&mut self) {
        match self.reconciler.tick().await {
            Ok(outcome) => self.report(outcome),
            Err(e) => {
                error!("tick failed: {}", e);
                self.emit(SchedulerEvent::TickFailed {
                    error: e.to_string(),
                });
            }
        }
    }

    fn report(&self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Created(record) => {
                info!(id = %record.id, content = %record.content, "created DNS record");
                self.emit(SchedulerEvent::RecordCreated {
                    id: record.id,
                    content: record.content,
                });
            }
            TickOutcome::Adopted(record) => {
                info!(id = %record.id, content = %record.content, "adopted existing DNS record");
                self.emit(SchedulerEvent::RecordAdopted {
                    id: record.id,
                    content: record.content,
                });
            }
            TickOutcome::Updated { previous, record } => {
                info!(
                    id = %record.id,
                    "updated DNS record: {} -> {}",
                    previous,
                    record.content
                );
                self.emit(SchedulerEvent::Updated {
                    id: record.id,
                    previous,
                    new: record.content,
                });
            }
            TickOutcome::Unchanged { content } => {
                debug!(%content, "DNS record unchanged");
                self.emit(SchedulerEvent::Unchanged { content });
            }
        }
    }

    fn emit(&self, event: SchedulerEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("event channel full, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_seconds_as_interval() {
        match "30".parse::<Schedule>() {
            Ok(Schedule::Every(d)) => assert_eq!(d, Duration::from_secs(30)),
            other => panic!("expected fixed interval, got {:?}", other),
        }
    }

    #[test]
    fn parses_cron_expression() {
        assert!(matches!(
            "0 */5 * * * *".parse::<Schedule>(),
            Ok(Schedule::Cron(_))
        ));
    }

    #[test]
    fn rejects_empty_and_zero_schedules() {
        assert!("".parse::<Schedule>().is_err());
        assert!("  ".parse::<Schedule>().is_err());
        assert!("0".parse::<Schedule>().is_err());
    }

    #[test]
    fn rejects_garbage_schedules() {
        assert!("every thirty seconds".parse::<Schedule>().is_err());
    }

    #[test]
    fn interval_delay_is_the_interval() {
        let schedule = Schedule::Every(Duration::from_secs(30));
        assert_eq!(schedule.next_delay(), Duration::from_secs(30));
    }

    #[test]
    fn cron_delay_is_within_the_period() {
        // Every second; the next firing is at most one second away.
        let schedule = "* * * * * *".parse::<Schedule>().unwrap();
        assert!(schedule.next_delay() <= Duration::from_secs(1));
    }
}
