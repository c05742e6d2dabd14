//! Polling-based completion detection.
//!
//! The engine exposes no push interface for "your submission finished",
//! so the orchestrator polls the queue-status endpoint until both the
//! running and pending queues are empty in the same snapshot. The poll
//! loop is the only thing bounding worst-case blocking: exhausting the
//! attempt cap is a fatal timeout.

use std::time::Duration;

use crate::transport::EngineTransport;

/// Tunable parameters for the completion poll loop.
pub struct PollConfig {
    /// Delay between consecutive queue-status polls.
    pub interval: Duration,
    /// Hard cap on poll attempts before giving up.
    pub max_attempts: u32,
    /// Log a transport failure at `warn` only every this-many
    /// failures; the rest go to `debug` to bound log volume.
    /// Zero is treated as 1 (warn on every failure).
    pub failure_log_every: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            // 600 attempts at 500 ms is roughly a five-minute budget.
            interval: Duration::from_millis(500),
            max_attempts: 600,
            failure_log_every: 20,
        }
    }
}

/// Errors from the completion monitor.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The queue never drained within the attempt budget.
    #[error("queue did not drain after {attempts} polls")]
    Timeout {
        /// Number of polls performed before giving up.
        attempts: u32,
    },
}

/// Waits for the engine queue to drain.
pub struct CompletionMonitor {
    config: PollConfig,
}

impl CompletionMonitor {
    /// Create a monitor with specific poll tunables.
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Block until the engine queue is fully drained.
    ///
    /// Polls [`EngineTransport::queue_status`] at the configured
    /// interval. Transport failures do not terminate the wait: they
    /// are logged (periodically) and retried within the same attempt
    /// budget, because a flaky poll says nothing about whether the
    /// submission is still running. There is no cancellation; the only
    /// exits are a drained queue or [`MonitorError::Timeout`].
    pub async fn wait_for_idle<T: EngineTransport + ?Sized>(
        &self,
        transport: &T,
    ) -> Result<(), MonitorError> {
        let mut failures = 0u32;
        let log_every = self.config.failure_log_every.max(1);

        for attempt in 1..=self.config.max_attempts {
            match transport.queue_status().await {
                Ok(status) if status.is_idle() => {
                    tracing::debug!(attempt, "engine queue drained");
                    return Ok(());
                }
                Ok(status) => {
                    tracing::trace!(
                        attempt,
                        running = status.queue_running.len(),
                        pending = status.queue_pending.len(),
                        "engine queue still busy",
                    );
                }
                Err(e) => {
                    failures += 1;
                    if (failures - 1) % log_every == 0 {
                        tracing::warn!(
                            attempt,
                            failures,
                            error = %e,
                            "queue status poll failed, retrying",
                        );
                    } else {
                        tracing::debug!(attempt, error = %e, "queue status poll failed");
                    }
                }
            }

            tokio::time::sleep(self.config.interval).await;
        }

        tracing::error!(
            attempts = self.config.max_attempts,
            "gave up waiting for the engine queue to drain",
        );
        Err(MonitorError::Timeout {
            attempts: self.config.max_attempts,
        })
    }
}

impl Default for CompletionMonitor {
    fn default() -> Self {
        Self::new(PollConfig::default())
    }
}
