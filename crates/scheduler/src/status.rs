//! Status snapshots for presentation layers.
//!
//! After each state transition the scheduler publishes a passive
//! [`StatusSnapshot`] on a `tokio::sync::broadcast` channel. Consumers
//! (progress panels, toasts, whatever sits on top) subscribe and
//! render; the scheduler never waits for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use groupflow_core::types::NodeId;

/// Broadcast channel capacity for status snapshots.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 256;

/// Coarse run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Idle,
    Running,
    Error,
}

/// A passive snapshot of the scheduler's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Coarse state of the run.
    pub status: RunStatus,

    /// Group currently executing, if any.
    pub current_group: Option<String>,

    /// All group names in the run's execution list (delays excluded).
    pub group_list: Vec<String>,

    /// Sorted output node ids of the current group.
    pub current_nodes: Vec<NodeId>,

    /// How the run was invoked (currently always `"list"`).
    pub execution_mode: String,

    /// Identifier of this run, minted at lock acquisition.
    pub execution_id: String,

    /// When the snapshot was taken (UTC).
    pub timestamp: DateTime<Utc>,
}

/// Fan-out publisher for status snapshots.
///
/// Wraps a [`broadcast::Sender`] so any number of subscribers can
/// independently observe every transition.
pub struct StatusBroadcaster {
    sender: broadcast::Sender<StatusSnapshot>,
}

impl StatusBroadcaster {
    /// Create a broadcaster with a specific channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a snapshot to all current subscribers.
    ///
    /// If there are no active subscribers the snapshot is silently
    /// dropped.
    pub fn publish(&self, snapshot: StatusSnapshot) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(snapshot);
    }

    /// Subscribe to all snapshots published on this broadcaster.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusSnapshot> {
        self.sender.subscribe()
    }
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new(SNAPSHOT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(status: RunStatus) -> StatusSnapshot {
        StatusSnapshot {
            status,
            current_group: Some("base".into()),
            group_list: vec!["base".into(), "detail".into()],
            current_nodes: vec!["5".into()],
            execution_mode: "list".into(),
            execution_id: "run-1".into(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_and_receive() {
        let broadcaster = StatusBroadcaster::default();
        let mut rx = broadcaster.subscribe();

        broadcaster.publish(snapshot(RunStatus::Running));

        let received = rx.recv().await.expect("should receive the snapshot");
        assert_eq!(received.status, RunStatus::Running);
        assert_eq!(received.current_group.as_deref(), Some("base"));
    }

    #[tokio::test]
    async fn multiple_subscribers_see_every_snapshot() {
        let broadcaster = StatusBroadcaster::default();
        let mut rx1 = broadcaster.subscribe();
        let mut rx2 = broadcaster.subscribe();

        broadcaster.publish(snapshot(RunStatus::Idle));

        assert_eq!(rx1.recv().await.unwrap().status, RunStatus::Idle);
        assert_eq!(rx2.recv().await.unwrap().status, RunStatus::Idle);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let broadcaster = StatusBroadcaster::default();
        broadcaster.publish(snapshot(RunStatus::Error));
    }

    #[test]
    fn run_status_serializes_snake_case() {
        let json = serde_json::to_string(&RunStatus::Running).unwrap();
        assert_eq!(json, r#""running""#);
    }
}
