//! Cache channel coordination.
//!
//! Cache-writing nodes running inside the engine persist their output
//! into a named channel. The coordinator moves that channel around
//! each group's execution so every group's cached artifacts land in
//! the group's own channel.
//!
//! The channel is advisory: a failed control call must not abort a
//! run, so failures are logged and swallowed here.

use std::sync::{Arc, Mutex};

use groupflow_engine::transport::EngineTransport;

/// Sets and clears the engine's active cache channel.
pub struct CacheChannelCoordinator {
    transport: Arc<dyn EngineTransport>,
    /// Last channel name we asked the engine to activate.
    active: Mutex<Option<String>>,
}

impl CacheChannelCoordinator {
    pub fn new(transport: Arc<dyn EngineTransport>) -> Self {
        Self {
            transport,
            active: Mutex::new(None),
        }
    }

    /// Set (`Some`) or clear (`None`) the active cache channel.
    ///
    /// Best effort: transport errors and engine-reported failures are
    /// logged, never raised. The locally tracked channel name is
    /// updated regardless so status snapshots reflect intent.
    pub async fn set_channel(&self, name: Option<&str>) {
        match self.transport.set_cache_channel(name).await {
            Ok(resp) if resp.success => {
                tracing::debug!(channel = ?name, "Cache channel updated");
            }
            Ok(resp) => {
                tracing::warn!(
                    channel = ?name,
                    error = resp.error.as_deref().unwrap_or("<unspecified>"),
                    "Engine rejected cache channel update",
                );
            }
            Err(e) => {
                tracing::warn!(channel = ?name, error = %e, "Cache channel update failed");
            }
        }

        *self.active.lock().unwrap_or_else(|e| e.into_inner()) = name.map(String::from);
    }

    /// The channel name most recently requested, if any.
    pub fn active_channel(&self) -> Option<String> {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
