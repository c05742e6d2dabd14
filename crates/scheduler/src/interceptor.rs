//! Submission interceptor: dependency-closure filtering in front of
//! the engine's submit call.
//!
//! Every submission the orchestrator makes goes through
//! [`SubmissionInterceptor::submit`]. The restriction is an explicit,
//! request-scoped parameter: it lives exactly as long as one call, so
//! there is no shared set/clear discipline to get wrong.
//!
//! A submission with no explicit restriction that contains
//! manager-typed nodes is implicitly restricted to those nodes. This
//! applies to *any* submission routed through the interceptor, not
//! only scheduler-initiated ones — an intentional coupling: a manager
//! node must never be submitted together with the full surrounding
//! graph, or the engine would execute everything twice.

use std::collections::BTreeSet;
use std::sync::Arc;

use groupflow_core::graph::{dependency_closure, node_types, JobGraph};
use groupflow_core::types::NodeId;
use groupflow_engine::api::{EngineApiError, SubmitResponse};
use groupflow_engine::transport::EngineTransport;

/// Filters submissions down to a restriction's dependency closure
/// before delegating to the engine transport.
pub struct SubmissionInterceptor {
    transport: Arc<dyn EngineTransport>,
}

impl SubmissionInterceptor {
    pub fn new(transport: Arc<dyn EngineTransport>) -> Self {
        Self { transport }
    }

    /// Submit `graph`, possibly rewritten to a minimal subgraph.
    ///
    /// In priority order:
    /// 1. a non-empty `restriction` replaces the node set with its
    ///    dependency closure;
    /// 2. otherwise, manager-typed nodes in the graph form a one-shot
    ///    restriction, consumed entirely within this call;
    /// 3. otherwise the graph passes through unmodified.
    pub async fn submit(
        &self,
        graph: &JobGraph,
        restriction: Option<&BTreeSet<NodeId>>,
        client_id: &str,
    ) -> Result<SubmitResponse, EngineApiError> {
        if let Some(targets) = restriction.filter(|t| !t.is_empty()) {
            let filtered = dependency_closure(targets, graph);
            tracing::debug!(
                targets = targets.len(),
                filtered = filtered.len(),
                total = graph.len(),
                "Submitting restricted subgraph",
            );
            return self.transport.submit_graph(&filtered, client_id).await;
        }

        let managers: BTreeSet<NodeId> = graph
            .iter()
            .filter(|(_, node)| node_types::is_manager(&node.node_type))
            .map(|(id, _)| id.clone())
            .collect();

        if !managers.is_empty() {
            let filtered = dependency_closure(&managers, graph);
            tracing::debug!(
                managers = managers.len(),
                filtered = filtered.len(),
                total = graph.len(),
                "Submission contains manager nodes, restricting to them",
            );
            return self.transport.submit_graph(&filtered, client_id).await;
        }

        self.transport.submit_graph(graph, client_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use groupflow_core::graph::{InputValue, JobNode};
    use groupflow_engine::api::{ChannelResponse, QueueStatus};

    use super::*;

    /// Transport that records every submitted node-id set.
    #[derive(Default)]
    struct RecordingTransport {
        submissions: Mutex<Vec<Vec<NodeId>>>,
    }

    impl RecordingTransport {
        fn submitted(&self) -> Vec<Vec<NodeId>> {
            self.submissions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EngineTransport for RecordingTransport {
        async fn submit_graph(
            &self,
            graph: &JobGraph,
            _client_id: &str,
        ) -> Result<SubmitResponse, EngineApiError> {
            self.submissions
                .lock()
                .unwrap()
                .push(graph.keys().cloned().collect());
            Ok(SubmitResponse {
                prompt_id: "p-1".into(),
                number: 0,
            })
        }

        async fn queue_status(&self) -> Result<QueueStatus, EngineApiError> {
            Ok(QueueStatus::default())
        }

        async fn set_cache_channel(
            &self,
            _channel_name: Option<&str>,
        ) -> Result<ChannelResponse, EngineApiError> {
            Ok(ChannelResponse {
                success: true,
                error: None,
            })
        }
    }

    fn node(node_type: &str, refs: &[(&str, &str)]) -> JobNode {
        JobNode {
            node_type: node_type.to_string(),
            inputs: refs
                .iter()
                .map(|(name, src)| {
                    (
                        name.to_string(),
                        InputValue::Reference(src.to_string(), 0),
                    )
                })
                .collect(),
        }
    }

    /// 1 -> 2 -> 3, unrelated 4.
    fn graph() -> JobGraph {
        let mut g = JobGraph::new();
        g.insert("1".into(), node("CheckpointLoader", &[]));
        g.insert("2".into(), node("KSampler", &[("model", "1")]));
        g.insert("3".into(), node("SaveImage", &[("images", "2")]));
        g.insert("4".into(), node("SaveImage", &[]));
        g
    }

    fn restriction(ids: &[&str]) -> BTreeSet<NodeId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn explicit_restriction_filters_to_closure() {
        let transport = Arc::new(RecordingTransport::default());
        let interceptor = SubmissionInterceptor::new(transport.clone());

        interceptor
            .submit(&graph(), Some(&restriction(&["3"])), "c-1")
            .await
            .unwrap();

        assert_eq!(transport.submitted(), vec![vec!["1", "2", "3"]]);
    }

    #[tokio::test]
    async fn empty_restriction_falls_through() {
        let transport = Arc::new(RecordingTransport::default());
        let interceptor = SubmissionInterceptor::new(transport.clone());

        let empty = BTreeSet::new();
        interceptor
            .submit(&graph(), Some(&empty), "c-1")
            .await
            .unwrap();

        // No restriction and no managers: the full graph goes through.
        assert_eq!(transport.submitted(), vec![vec!["1", "2", "3", "4"]]);
    }

    #[tokio::test]
    async fn manager_nodes_trigger_one_shot_restriction() {
        let mut g = graph();
        g.insert(
            "10".into(),
            node(node_types::GROUP_MANAGER, &[("signal", "1")]),
        );

        let transport = Arc::new(RecordingTransport::default());
        let interceptor = SubmissionInterceptor::new(transport.clone());

        interceptor.submit(&g, None, "c-1").await.unwrap();

        // Restricted to the manager and its closure; the rest of the
        // graph is dropped.
        assert_eq!(transport.submitted(), vec![vec!["1", "10"]]);
    }

    #[tokio::test]
    async fn manager_restriction_does_not_persist_across_calls() {
        let mut with_manager = graph();
        with_manager.insert("10".into(), node(node_types::GROUP_MANAGER, &[]));

        let transport = Arc::new(RecordingTransport::default());
        let interceptor = SubmissionInterceptor::new(transport.clone());

        interceptor.submit(&with_manager, None, "c-1").await.unwrap();
        interceptor.submit(&graph(), None, "c-2").await.unwrap();

        // The second submission is untouched by the first call's
        // one-shot manager restriction.
        assert_eq!(
            transport.submitted(),
            vec![vec!["10"], vec!["1", "2", "3", "4"]]
        );
    }

    #[tokio::test]
    async fn explicit_restriction_wins_over_managers() {
        let mut g = graph();
        g.insert("10".into(), node(node_types::GROUP_MANAGER, &[]));

        let transport = Arc::new(RecordingTransport::default());
        let interceptor = SubmissionInterceptor::new(transport.clone());

        interceptor
            .submit(&g, Some(&restriction(&["4"])), "c-1")
            .await
            .unwrap();

        assert_eq!(transport.submitted(), vec![vec!["4"]]);
    }

    #[tokio::test]
    async fn plain_graph_passes_through() {
        let transport = Arc::new(RecordingTransport::default());
        let interceptor = SubmissionInterceptor::new(transport.clone());

        interceptor.submit(&graph(), None, "c-1").await.unwrap();

        assert_eq!(transport.submitted(), vec![vec!["1", "2", "3", "4"]]);
    }
}
