//! Engine WebSocket message types and parser.
//!
//! The engine pushes JSON messages over WebSocket with the shape
//! `{"type": "<kind>", "data": {...}}`. This module deserializes the
//! kinds the orchestrator cares about into a strongly-typed
//! [`EngineMessage`] enum; everything else parses as an error the
//! caller logs and skips.

use serde::Deserialize;

use groupflow_core::list::TriggerEvent;

/// Engine WebSocket message types the orchestrator consumes.
///
/// Deserialized via the internally-tagged `"type"` field with
/// associated `"data"` content.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EngineMessage {
    /// Server status broadcast (queue depth, etc.).
    #[serde(rename = "status")]
    Status(StatusData),

    /// A specific node is currently executing (or execution finished
    /// when `node` is `None`).
    #[serde(rename = "executing")]
    Executing(ExecutingData),

    /// Execution failed with an error.
    #[serde(rename = "execution_error")]
    ExecutionError(ErrorData),

    /// A group trigger node fired: start a scheduled run.
    #[serde(rename = "group_trigger")]
    GroupTrigger(TriggerEvent),
}

/// Queue status information.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusData {
    pub status: StatusInfo,
}

/// Current queue state.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusInfo {
    pub exec_info: ExecInfo,
}

/// Execution queue statistics.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecInfo {
    pub queue_remaining: i32,
}

/// Payload for `executing` messages.
///
/// When `node` is `None`, execution of the submission has completed.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutingData {
    pub node: Option<String>,
    pub prompt_id: String,
}

/// Payload for `execution_error` messages.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorData {
    pub prompt_id: String,
    pub node_id: String,
    pub exception_message: String,
    pub exception_type: String,
}

/// Parse an engine WebSocket text message into a typed enum.
///
/// Returns `Err` for malformed JSON or unknown `type` values.
/// Callers should log unknown types and continue.
pub fn parse_message(text: &str) -> Result<EngineMessage, serde_json::Error> {
    serde_json::from_str(text)
}
