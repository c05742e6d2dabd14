//! Sequential multi-group scheduler.
//!
//! [`GroupScheduler`] is the top-level state machine. A trigger event
//! delivers an ordered execution list; the scheduler takes the
//! per-trigger lock, then for each item resolves the group's output
//! nodes, moves the cache channel, submits the restricted subgraph,
//! and waits for the engine queue to drain before touching the next
//! item. Later groups may depend on side effects of earlier ones
//! (cached files tagged by channel), so group N+1 must never be
//! submitted before group N has fully drained.
//!
//! There is no rollback: a failure mid-list aborts the remaining items
//! and leaves prior groups' outputs intact.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;

use groupflow_core::canvas::GraphModel;
use groupflow_core::list::TriggerEvent;
use groupflow_core::ordering::sort_node_ids;
use groupflow_core::types::NodeId;
use groupflow_engine::api::EngineApiError;
use groupflow_engine::monitor::{CompletionMonitor, MonitorError};
use groupflow_engine::transport::EngineTransport;

use crate::channel::CacheChannelCoordinator;
use crate::interceptor::SubmissionInterceptor;
use crate::lock::ExecutionLock;
use crate::status::{RunStatus, StatusBroadcaster, StatusSnapshot};

/// Errors that can abort a scheduled run.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The trigger re-entered while a run was still in flight.
    /// Rejected immediately; there is no queueing.
    #[error("trigger {0} already has a run in progress")]
    AlreadyRunning(NodeId),

    /// A group's graph submission failed. Fatal to the run.
    #[error("graph submission failed: {0}")]
    Submit(#[source] EngineApiError),

    /// The completion monitor exhausted its poll budget.
    #[error(transparent)]
    Timeout(#[from] MonitorError),
}

/// Executes ordered group lists against the engine, one group at a
/// time.
pub struct GroupScheduler {
    model: Arc<dyn GraphModel + Send + Sync>,
    transport: Arc<dyn EngineTransport>,
    interceptor: SubmissionInterceptor,
    channels: CacheChannelCoordinator,
    monitor: CompletionMonitor,
    lock: ExecutionLock,
    status: StatusBroadcaster,
}

impl GroupScheduler {
    /// Create a scheduler with the default completion-poll tunables.
    pub fn new(
        model: Arc<dyn GraphModel + Send + Sync>,
        transport: Arc<dyn EngineTransport>,
    ) -> Self {
        Self::with_monitor(model, transport, CompletionMonitor::default())
    }

    /// Create a scheduler with specific completion-poll tunables.
    pub fn with_monitor(
        model: Arc<dyn GraphModel + Send + Sync>,
        transport: Arc<dyn EngineTransport>,
        monitor: CompletionMonitor,
    ) -> Self {
        Self {
            model,
            interceptor: SubmissionInterceptor::new(Arc::clone(&transport)),
            channels: CacheChannelCoordinator::new(Arc::clone(&transport)),
            transport,
            monitor,
            lock: ExecutionLock::default(),
            status: StatusBroadcaster::default(),
        }
    }

    /// Subscribe to status snapshots published after each transition.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusSnapshot> {
        self.status.subscribe()
    }

    /// Execute an ordered list of groups for one trigger.
    ///
    /// Fails immediately with [`SchedulerError::AlreadyRunning`] when
    /// this trigger already has a run in flight. On any other error
    /// the remaining items are not executed, completed groups' side
    /// effects are not reverted, and the lock is released before the
    /// error reaches the caller.
    pub async fn execute_list(&self, trigger: &TriggerEvent) -> Result<(), SchedulerError> {
        let Some(_guard) = self.lock.acquire(&trigger.node_id) else {
            tracing::warn!(trigger = %trigger.node_id, "Rejected reentrant trigger");
            return Err(SchedulerError::AlreadyRunning(trigger.node_id.clone()));
        };

        let execution_id = uuid::Uuid::new_v4().to_string();
        let group_list: Vec<String> = trigger
            .execution_list
            .iter()
            .filter(|item| !item.is_delay())
            .map(|item| item.group_name.clone())
            .collect();

        tracing::info!(
            trigger = %trigger.node_id,
            execution_id = %execution_id,
            groups = group_list.len(),
            "Starting group run",
        );
        self.publish(RunStatus::Running, None, &group_list, &[], &execution_id);

        let result = self.run_items(trigger, &group_list, &execution_id).await;

        match &result {
            Ok(()) => {
                tracing::info!(execution_id = %execution_id, "Group run completed");
                self.publish(RunStatus::Idle, None, &group_list, &[], &execution_id);
            }
            Err(e) => {
                tracing::error!(execution_id = %execution_id, error = %e, "Group run aborted");
                self.publish(RunStatus::Error, None, &group_list, &[], &execution_id);
            }
        }

        // The lock guard drops here on both paths.
        result
    }

    // ---- private helpers ----

    /// Walk the execution list in order, aborting on the first fatal
    /// error.
    async fn run_items(
        &self,
        trigger: &TriggerEvent,
        group_list: &[String],
        execution_id: &str,
    ) -> Result<(), SchedulerError> {
        let total = trigger.execution_list.len();

        for (index, item) in trigger.execution_list.iter().enumerate() {
            if item.is_delay() {
                if item.delay_seconds > 0.0 {
                    tracing::debug!(seconds = item.delay_seconds, "Delay item, sleeping");
                    tokio::time::sleep(Duration::from_secs_f64(item.delay_seconds)).await;
                }
                continue;
            }

            let nodes = self.resolve_output_nodes(&item.group_name);
            if nodes.is_empty() {
                // Soft failure: nothing to submit for this group.
                tracing::warn!(
                    group = %item.group_name,
                    "Group resolved to zero eligible output nodes, skipping",
                );
                continue;
            }

            tracing::info!(
                group = %item.group_name,
                nodes = ?nodes,
                "Executing group",
            );
            self.publish(
                RunStatus::Running,
                Some(&item.group_name),
                group_list,
                &nodes,
                execution_id,
            );

            self.execute_group(&item.group_name, &nodes, execution_id)
                .await?;

            // Inter-item delay; pointless after the last item.
            if item.delay_seconds > 0.0 && index + 1 < total {
                tracing::debug!(
                    group = %item.group_name,
                    seconds = item.delay_seconds,
                    "Sleeping before next item",
                );
                tokio::time::sleep(Duration::from_secs_f64(item.delay_seconds)).await;
            }
        }

        Ok(())
    }

    /// Resolve a group to its sorted, eligible output node ids.
    ///
    /// Eligible = inside the group's bounds, produces external output,
    /// and in an active execution mode.
    fn resolve_output_nodes(&self, group_name: &str) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .model
            .nodes_in_group_bounds(group_name)
            .into_iter()
            .filter(|id| self.model.is_output_node(id) && self.model.is_node_active(id))
            .collect();
        sort_node_ids(&mut ids);
        ids
    }

    /// Run one group: channel on, submit restricted, wait for drain,
    /// channel off.
    ///
    /// The channel clear runs unconditionally, before any submit or
    /// wait error is allowed to propagate.
    async fn execute_group(
        &self,
        group_name: &str,
        nodes: &[NodeId],
        execution_id: &str,
    ) -> Result<(), SchedulerError> {
        self.channels.set_channel(Some(group_name)).await;

        let outcome = self.submit_and_wait(nodes, execution_id).await;

        self.channels.set_channel(None).await;
        outcome
    }

    /// Submit the restricted subgraph and wait until the queue drains.
    async fn submit_and_wait(
        &self,
        nodes: &[NodeId],
        execution_id: &str,
    ) -> Result<(), SchedulerError> {
        let graph = self.model.job_graph();
        let restriction: BTreeSet<NodeId> = nodes.iter().cloned().collect();

        self.interceptor
            .submit(&graph, Some(&restriction), execution_id)
            .await
            .map_err(SchedulerError::Submit)?;

        self.monitor.wait_for_idle(&*self.transport).await?;
        Ok(())
    }

    fn publish(
        &self,
        status: RunStatus,
        current_group: Option<&str>,
        group_list: &[String],
        current_nodes: &[NodeId],
        execution_id: &str,
    ) {
        self.status.publish(StatusSnapshot {
            status,
            current_group: current_group.map(String::from),
            group_list: group_list.to_vec(),
            current_nodes: current_nodes.to_vec(),
            execution_mode: "list".into(),
            execution_id: execution_id.to_string(),
            timestamp: Utc::now(),
        });
    }
}
