//! Per-trigger reentrancy guard.
//!
//! A trigger node must not start a second run while its first is
//! still in flight: the restriction and channel side effects assume
//! one submission at a time. Reentrant invocation is rejected
//! immediately rather than queued.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use groupflow_core::types::NodeId;

/// Tracks which trigger ids currently have a run in flight.
#[derive(Clone, Default)]
pub struct ExecutionLock {
    held: Arc<Mutex<HashSet<NodeId>>>,
}

/// RAII guard for one trigger's run.
///
/// Dropping the guard releases the lock, so every exit path — normal
/// return, `?`, or panic unwind — releases.
pub struct ExecutionGuard {
    trigger_id: NodeId,
    held: Arc<Mutex<HashSet<NodeId>>>,
}

impl ExecutionLock {
    /// Try to acquire the lock for `trigger_id`.
    ///
    /// Returns `None` when a run for this trigger is already in
    /// flight. There is no queueing and no retry.
    pub fn acquire(&self, trigger_id: &str) -> Option<ExecutionGuard> {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if !held.insert(trigger_id.to_string()) {
            return None;
        }
        Some(ExecutionGuard {
            trigger_id: trigger_id.to_string(),
            held: Arc::clone(&self.held),
        })
    }

    /// Whether a run for `trigger_id` is currently in flight.
    pub fn is_held(&self, trigger_id: &str) -> bool {
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(trigger_id)
    }
}

impl Drop for ExecutionGuard {
    fn drop(&mut self) {
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.trigger_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_release() {
        let lock = ExecutionLock::default();
        let guard = lock.acquire("17").expect("first acquire succeeds");
        assert!(lock.is_held("17"));
        drop(guard);
        assert!(!lock.is_held("17"));
    }

    #[test]
    fn reentrant_acquire_rejected() {
        let lock = ExecutionLock::default();
        let _guard = lock.acquire("17").unwrap();
        assert!(lock.acquire("17").is_none());
    }

    #[test]
    fn distinct_triggers_lock_independently() {
        let lock = ExecutionLock::default();
        let _a = lock.acquire("17").unwrap();
        let _b = lock.acquire("23").expect("different trigger id is free");
        assert!(lock.is_held("17"));
        assert!(lock.is_held("23"));
    }

    #[test]
    fn released_lock_can_be_reacquired() {
        let lock = ExecutionLock::default();
        drop(lock.acquire("17").unwrap());
        assert!(lock.acquire("17").is_some());
    }
}
