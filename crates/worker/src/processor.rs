//! Engine WebSocket message processing loop.
//!
//! Reads raw frames from an engine connection, parses them into typed
//! [`EngineMessage`] variants, and dispatches group trigger events to
//! the scheduler.

use std::sync::Arc;

use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;

use groupflow_engine::client::EngineStream;
use groupflow_engine::messages::{parse_message, EngineMessage};
use groupflow_scheduler::scheduler::{GroupScheduler, SchedulerError};

/// Process WebSocket messages from an engine connection.
///
/// Loops until the WebSocket closes, encounters a fatal receive error,
/// or the stream is exhausted. Each text frame is parsed via
/// [`parse_message`]; trigger events start a scheduled run on a
/// spawned task so the loop keeps consuming frames while a run is in
/// flight (the scheduler's own lock rejects overlapping triggers).
pub async fn process_messages(ws_stream: &mut EngineStream, scheduler: &Arc<GroupScheduler>) {
    while let Some(msg_result) = ws_stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                handle_text_message(&text, scheduler);
            }
            Ok(Message::Binary(_)) => {
                // The engine sends binary frames for preview images;
                // nothing here consumes them.
                tracing::trace!("Ignoring binary message (preview image)");
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // Handled automatically by tungstenite.
            }
            Ok(Message::Close(frame)) => {
                tracing::info!(?frame, "Engine WebSocket closed");
                break;
            }
            Ok(Message::Frame(_)) => {}
            Err(e) => {
                tracing::error!(error = %e, "WebSocket receive error");
                break;
            }
        }
    }
}

/// Dispatch a single parsed text frame.
fn handle_text_message(text: &str, scheduler: &Arc<GroupScheduler>) {
    match parse_message(text) {
        Ok(EngineMessage::GroupTrigger(event)) => {
            tracing::info!(
                trigger = %event.node_id,
                items = event.execution_list.len(),
                "Received group trigger",
            );
            let scheduler = Arc::clone(scheduler);
            tokio::spawn(async move {
                match scheduler.execute_list(&event).await {
                    Ok(()) => {}
                    Err(SchedulerError::AlreadyRunning(id)) => {
                        tracing::warn!(trigger = %id, "Trigger ignored, run already in flight");
                    }
                    Err(e) => {
                        tracing::error!(trigger = %event.node_id, error = %e, "Group run failed");
                    }
                }
            });
        }
        Ok(EngineMessage::Status(data)) => {
            tracing::debug!(
                queue_remaining = data.status.exec_info.queue_remaining,
                "Engine queue status",
            );
        }
        Ok(EngineMessage::Executing(data)) => {
            tracing::trace!(node = ?data.node, prompt_id = %data.prompt_id, "Engine executing");
        }
        Ok(EngineMessage::ExecutionError(data)) => {
            tracing::error!(
                node_id = %data.node_id,
                prompt_id = %data.prompt_id,
                error = %data.exception_message,
                "Engine reported an execution error",
            );
        }
        Err(e) => {
            // Unknown message kinds are expected; the engine chats a
            // lot more than we listen to.
            tracing::trace!(error = %e, "Skipping unhandled engine message");
        }
    }
}
