//! Worker configuration from environment variables.

use std::env;

/// Runtime configuration for the worker process.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Engine HTTP base URL (`GROUPFLOW_ENGINE_URL`).
    pub engine_url: String,
    /// Engine WebSocket base URL (`GROUPFLOW_WS_URL`).
    pub ws_url: String,
    /// Path to the canvas document JSON (`GROUPFLOW_WORKFLOW`).
    pub workflow_path: String,
}

impl WorkerConfig {
    /// Read configuration from the environment, falling back to a
    /// local engine on the default port.
    pub fn from_env() -> Self {
        Self {
            engine_url: env::var("GROUPFLOW_ENGINE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8188".into()),
            ws_url: env::var("GROUPFLOW_WS_URL")
                .unwrap_or_else(|_| "ws://127.0.0.1:8188".into()),
            workflow_path: env::var("GROUPFLOW_WORKFLOW")
                .unwrap_or_else(|_| "workflow.json".into()),
        }
    }
}
