//! WebSocket client for the engine's event stream.
//!
//! The worker holds the engine open over one long-lived WebSocket:
//! trigger events and status broadcasts arrive on it, and when it
//! drops the worker must get back on as soon as the engine allows.
//! [`EngineClient`] owns both halves of that contract: establishing a
//! stream ([`connect`](EngineClient::connect)) and re-establishing it
//! with backoff until cancelled
//! ([`connect_with_retry`](EngineClient::connect_with_retry)).

use std::time::Duration;

use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

/// The raw frame stream [`EngineClient::connect`] produces.
///
/// This is all the worker's message loop consumes; everything else
/// about the connection (client id, URL) stays inside the client.
pub type EngineStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

// ---------------------------------------------------------------------------
// Backoff policy
// ---------------------------------------------------------------------------

/// Exponential-backoff tunables for reconnection.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the second connection attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub factor: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            factor: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// The infinite delay sequence this policy prescribes:
    /// `initial, initial*factor, ...`, clamped at `max_delay`.
    pub fn delays(&self) -> Delays {
        Delays {
            next: self.initial_delay,
            max: self.max_delay,
            factor: self.factor,
        }
    }
}

/// Iterator over a [`BackoffPolicy`]'s delay sequence. Never ends.
pub struct Delays {
    next: Duration,
    max: Duration,
    factor: f64,
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        let grown_ms = (current.as_millis() as f64 * self.factor) as u64;
        self.next = Duration::from_millis(grown_ms).min(self.max);
        Some(current)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Connects to an engine's WebSocket event endpoint.
pub struct EngineClient {
    ws_url: String,
    backoff: BackoffPolicy,
}

impl EngineClient {
    /// Create a client with the default backoff policy.
    ///
    /// * `ws_url` - WebSocket base URL, e.g. `ws://host:8188`.
    pub fn new(ws_url: String) -> Self {
        Self::with_backoff(ws_url, BackoffPolicy::default())
    }

    /// Create a client with a specific backoff policy.
    pub fn with_backoff(ws_url: String, backoff: BackoffPolicy) -> Self {
        Self { ws_url, backoff }
    }

    /// Open the engine WebSocket once.
    ///
    /// Generates a fresh `client_id` (UUID v4) and appends it as a
    /// query parameter so the engine can address trigger events back
    /// to this subscriber.
    pub async fn connect(&self) -> Result<EngineStream, EngineClientError> {
        let client_id = uuid::Uuid::new_v4().to_string();
        let url = format!("{}/ws?clientId={}", self.ws_url, client_id);

        let (ws_stream, _response) = connect_async(&url).await.map_err(|e| {
            EngineClientError::Connection(format!(
                "failed to connect to engine at {}: {e}",
                self.ws_url
            ))
        })?;

        tracing::info!(
            client_id = %client_id,
            "Connected to engine at {}",
            self.ws_url,
        );

        Ok(ws_stream)
    }

    /// Open the engine WebSocket, retrying with backoff until it
    /// succeeds or `cancel` is triggered.
    ///
    /// Returns `None` only on cancellation. The delay sequence follows
    /// this client's [`BackoffPolicy`]; each attempt and each sleep
    /// respects the token, so shutdown is never stuck behind a
    /// pending backoff.
    pub async fn connect_with_retry(&self, cancel: &CancellationToken) -> Option<EngineStream> {
        let mut delays = self.backoff.delays();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Connect cancelled");
                    return None;
                }
                result = self.connect() => {
                    match result {
                        Ok(stream) => return Some(stream),
                        Err(e) => {
                            tracing::warn!(
                                attempt,
                                error = %e,
                                "Engine connection attempt failed",
                            );
                        }
                    }
                }
            }

            let delay = delays
                .next()
                .unwrap_or(self.backoff.max_delay);
            tracing::debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Backing off before next connection attempt",
            );

            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

/// Errors that can occur when working with the WebSocket client.
#[derive(Debug, thiserror::Error)]
pub enum EngineClientError {
    /// Failed to establish the WebSocket connection.
    #[error("connection error: {0}")]
    Connection(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delays_double_then_clamp() {
        let policy = BackoffPolicy::default();
        let delays: Vec<u64> = policy.delays().take(8).map(|d| d.as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30, 30]);
    }

    #[test]
    fn custom_factor_grows_accordingly() {
        let policy = BackoffPolicy {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            factor: 3.0,
        };
        let delays: Vec<u64> = policy.delays().take(4).map(|d| d.as_secs()).collect();
        assert_eq!(delays, vec![2, 6, 18, 54]);
    }

    #[test]
    fn delays_never_exceed_max() {
        let policy = BackoffPolicy {
            initial_delay: Duration::from_secs(8),
            max_delay: Duration::from_secs(10),
            factor: 2.0,
        };
        assert!(policy.delays().take(20).all(|d| d <= Duration::from_secs(10)));
    }

    #[test]
    fn delay_sequence_is_endless() {
        let policy = BackoffPolicy::default();
        // A reconnect loop pulls from this forever; it must not dry up.
        assert_eq!(policy.delays().nth(10_000).map(|d| d.as_secs()), Some(30));
    }

    #[tokio::test]
    async fn retry_stops_immediately_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let client = EngineClient::new("ws://localhost:9999".into());
        assert!(client.connect_with_retry(&cancel).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_stops_when_cancelled_during_backoff() {
        // Nothing listens on this address, so every attempt fails and
        // the loop parks in its backoff sleep — which is where the
        // cancellation must catch it.
        let client = EngineClient::with_backoff(
            "ws://127.0.0.1:1".into(),
            BackoffPolicy {
                initial_delay: Duration::from_secs(3600),
                max_delay: Duration::from_secs(3600),
                factor: 1.0,
            },
        );

        let cancel = CancellationToken::new();
        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { client.connect_with_retry(&cancel).await.is_none() })
        };

        // Let the first attempt fail and the backoff sleep begin.
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
        cancel.cancel();

        assert!(handle.await.unwrap());
    }
}
