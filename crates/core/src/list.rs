//! Execution list and trigger event types.
//!
//! A trigger node in the graph emits a [`TriggerEvent`] when it runs.
//! The event carries an ordered list of [`ExecutionListItem`]s naming
//! the groups to execute sequentially, with optional delays between
//! them.

use serde::{Deserialize, Serialize};

use crate::types::NodeId;

/// Sentinel group name meaning "pure delay, no group resolution".
pub const DELAY_SENTINEL: &str = "__delay__";

/// One entry of an ordered execution list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionListItem {
    /// Name of the group to execute, or [`DELAY_SENTINEL`].
    pub group_name: String,

    /// Seconds to sleep after this item (or for the whole item when it
    /// is the delay sentinel). Never negative.
    #[serde(default)]
    pub delay_seconds: f64,
}

impl ExecutionListItem {
    /// Whether this item is a pure delay rather than a group.
    pub fn is_delay(&self) -> bool {
        self.group_name == DELAY_SENTINEL
    }
}

/// Inbound trigger event starting a scheduled run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Id of the trigger node that fired. Doubles as the reentrancy
    /// lock key: a trigger cannot start a second run while its first
    /// is still going.
    pub node_id: NodeId,

    /// Groups to execute, in order.
    pub execution_list: Vec<ExecutionListItem>,

    /// Engine-side timestamp of the trigger (seconds since epoch).
    pub timestamp: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_sentinel_recognised() {
        let item = ExecutionListItem {
            group_name: DELAY_SENTINEL.into(),
            delay_seconds: 2.0,
        };
        assert!(item.is_delay());
    }

    #[test]
    fn named_group_is_not_delay() {
        let item = ExecutionListItem {
            group_name: "upscale".into(),
            delay_seconds: 0.0,
        };
        assert!(!item.is_delay());
    }

    #[test]
    fn trigger_event_parses() {
        let json = r#"{
            "node_id": "17",
            "execution_list": [
                {"group_name": "base", "delay_seconds": 0},
                {"group_name": "__delay__", "delay_seconds": 2},
                {"group_name": "detail"}
            ],
            "timestamp": 1756100000.5
        }"#;
        let event: TriggerEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.node_id, "17");
        assert_eq!(event.execution_list.len(), 3);
        assert!(event.execution_list[1].is_delay());
        // delay_seconds defaults to zero when omitted.
        assert_eq!(event.execution_list[2].delay_seconds, 0.0);
    }

    #[test]
    fn trigger_event_round_trips() {
        let event = TriggerEvent {
            node_id: "3".into(),
            execution_list: vec![ExecutionListItem {
                group_name: "final".into(),
                delay_seconds: 1.5,
            }],
            timestamp: 42.0,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: TriggerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
