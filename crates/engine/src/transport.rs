//! Transport trait the scheduler programs against.
//!
//! The scheduler only ever needs three engine calls: submit a graph,
//! read the queue depth, and move the cache channel. Putting them
//! behind a trait keeps the scheduler testable with an in-memory mock
//! that records call order.

use async_trait::async_trait;

use groupflow_core::graph::JobGraph;

use crate::api::{ChannelResponse, EngineApi, EngineApiError, QueueStatus, SubmitResponse};

/// The engine calls the orchestrator depends on.
#[async_trait]
pub trait EngineTransport: Send + Sync {
    /// Queue a graph for execution.
    async fn submit_graph(
        &self,
        graph: &JobGraph,
        client_id: &str,
    ) -> Result<SubmitResponse, EngineApiError>;

    /// Current queue depth snapshot.
    async fn queue_status(&self) -> Result<QueueStatus, EngineApiError>;

    /// Set (`Some`) or clear (`None`) the active cache channel.
    async fn set_cache_channel(
        &self,
        channel_name: Option<&str>,
    ) -> Result<ChannelResponse, EngineApiError>;
}

#[async_trait]
impl EngineTransport for EngineApi {
    async fn submit_graph(
        &self,
        graph: &JobGraph,
        client_id: &str,
    ) -> Result<SubmitResponse, EngineApiError> {
        EngineApi::submit_graph(self, graph, client_id).await
    }

    async fn queue_status(&self) -> Result<QueueStatus, EngineApiError> {
        EngineApi::queue_status(self).await
    }

    async fn set_cache_channel(
        &self,
        channel_name: Option<&str>,
    ) -> Result<ChannelResponse, EngineApiError> {
        EngineApi::set_cache_channel(self, channel_name).await
    }
}
