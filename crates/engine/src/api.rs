//! REST API client for the engine's HTTP endpoints.
//!
//! Wraps the engine HTTP API (graph submission, queue status, cache
//! channel control) using [`reqwest`].

use serde::Deserialize;

use groupflow_core::graph::JobGraph;

/// HTTP client for a single engine instance.
pub struct EngineApi {
    client: reqwest::Client,
    api_url: String,
}

/// Response returned by the engine's `/prompt` endpoint after
/// successfully queuing a graph.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned identifier for the queued submission.
    pub prompt_id: String,
    /// Position in the execution queue.
    pub number: i32,
}

/// Snapshot of the engine's execution queue, from `GET /queue`.
///
/// The entries are engine-defined blobs; the orchestrator only cares
/// about the counts.
#[derive(Debug, Default, Deserialize)]
pub struct QueueStatus {
    #[serde(default)]
    pub queue_running: Vec<serde_json::Value>,
    #[serde(default)]
    pub queue_pending: Vec<serde_json::Value>,
}

impl QueueStatus {
    /// Whether the queue has fully drained: nothing running and
    /// nothing pending in the same snapshot.
    pub fn is_idle(&self) -> bool {
        self.queue_running.is_empty() && self.queue_pending.is_empty()
    }
}

/// Response from the cache channel control endpoint.
#[derive(Debug, Deserialize)]
pub struct ChannelResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Errors from the engine REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum EngineApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The engine returned a non-2xx status code.
    #[error("engine API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl EngineApi {
    /// Create a new API client for an engine instance.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8188`.
    pub fn new(api_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// Submit an executable graph.
    ///
    /// Sends a `POST /prompt` request with the graph and client ID.
    /// Returns the server-assigned `prompt_id` and queue position.
    pub async fn submit_graph(
        &self,
        graph: &JobGraph,
        client_id: &str,
    ) -> Result<SubmitResponse, EngineApiError> {
        let body = serde_json::json!({
            "prompt": graph,
            "client_id": client_id,
        });

        let response = self
            .client
            .post(format!("{}/prompt", self.api_url))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the current queue state.
    ///
    /// Sends a `GET /queue` request. Polled by the completion monitor
    /// to detect when a submission has fully drained.
    pub async fn queue_status(&self) -> Result<QueueStatus, EngineApiError> {
        let response = self
            .client
            .get(format!("{}/queue", self.api_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Set or clear the active cache channel.
    ///
    /// Sends a `POST /channel` request telling concurrently-running
    /// cache-writing nodes which named channel to persist into.
    /// `None` clears the channel.
    pub async fn set_cache_channel(
        &self,
        channel_name: Option<&str>,
    ) -> Result<ChannelResponse, EngineApiError> {
        let body = serde_json::json!({
            "channel_name": channel_name,
        });

        let response = self
            .client
            .post(format!("{}/channel", self.api_url))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`EngineApiError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, EngineApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(EngineApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, EngineApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_queue_is_idle() {
        let status = QueueStatus::default();
        assert!(status.is_idle());
    }

    #[test]
    fn running_entries_are_not_idle() {
        let status = QueueStatus {
            queue_running: vec![serde_json::json!(["p-1"])],
            queue_pending: vec![],
        };
        assert!(!status.is_idle());
    }

    #[test]
    fn pending_entries_are_not_idle() {
        let status = QueueStatus {
            queue_running: vec![],
            queue_pending: vec![serde_json::json!(["p-2"])],
        };
        assert!(!status.is_idle());
    }

    #[test]
    fn queue_status_parses_with_missing_fields() {
        let status: QueueStatus = serde_json::from_str("{}").unwrap();
        assert!(status.is_idle());
    }

    #[test]
    fn channel_response_parses_without_error_field() {
        let resp: ChannelResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(resp.success);
        assert!(resp.error.is_none());
    }
}
