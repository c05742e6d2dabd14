//! Executable job graph model and dependency closure.
//!
//! A [`JobGraph`] is the wire form the engine accepts for submission:
//! a mapping from node id to `{type, inputs}`, where each input is
//! either a literal value or a reference to another node's output slot
//! (encoded as a two-element `["<node id>", <slot>]` array).
//!
//! [`dependency_closure`] reduces a full graph to the minimal subgraph
//! required to produce a requested set of target nodes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::NodeId;

// ---------------------------------------------------------------------------
// Node type constants
// ---------------------------------------------------------------------------

/// Node types with special meaning to the orchestrator.
pub mod node_types {
    /// Executes an ordered list of groups when triggered.
    pub const GROUP_MANAGER: &str = "GroupManager";

    /// Executes a single named group when triggered.
    pub const SINGLE_GROUP_MANAGER: &str = "SingleGroupManager";

    /// Emits the trigger event that starts a scheduled run.
    pub const GROUP_TRIGGER: &str = "GroupTrigger";

    /// Node types that coordinate group execution. A submission that
    /// contains one of these is implicitly restricted to them (see the
    /// submission interceptor).
    pub const MANAGER_TYPES: &[&str] = &[GROUP_MANAGER, SINGLE_GROUP_MANAGER];

    /// Check whether a node type coordinates group execution.
    pub fn is_manager(node_type: &str) -> bool {
        MANAGER_TYPES.contains(&node_type)
    }
}

// ---------------------------------------------------------------------------
// Graph model
// ---------------------------------------------------------------------------

/// A full executable graph keyed by node id.
///
/// `BTreeMap` keeps iteration and serialization order deterministic,
/// which the tests and logs rely on.
pub type JobGraph = BTreeMap<NodeId, JobNode>;

/// One node of an executable graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobNode {
    /// Engine node type, e.g. `"KSampler"` or `"SaveImage"`.
    #[serde(rename = "type")]
    pub node_type: String,

    /// Named inputs: literal values or references to upstream outputs.
    #[serde(default)]
    pub inputs: BTreeMap<String, InputValue>,
}

/// An input of a [`JobNode`].
///
/// The engine wire format encodes a reference to another node's output
/// as a two-element array `["<node id>", <slot index>]`; everything
/// else is a literal. `Reference` is listed first so the untagged
/// deserializer prefers it for arrays of that exact shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    /// Reference to `(source node id, source output slot)`.
    Reference(NodeId, u32),
    /// A plain literal (number, string, bool, object, ...).
    Literal(serde_json::Value),
}

impl InputValue {
    /// The referenced source node id, if this input is a reference.
    pub fn source_node(&self) -> Option<&NodeId> {
        match self {
            InputValue::Reference(id, _) => Some(id),
            InputValue::Literal(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dependency closure
// ---------------------------------------------------------------------------

/// Compute the minimal subgraph containing `targets` and everything
/// transitively required to produce them.
///
/// Membership in the result map doubles as the visited check, so each
/// node is processed once even when several downstream nodes depend on
/// it (diamond dependencies). Well-formed job graphs are DAGs by
/// construction upstream, so the traversal terminates.
///
/// Target ids absent from `graph` are silently skipped: there is no
/// node to close over, and the engine would reject a dangling id
/// anyway.
pub fn dependency_closure(targets: &BTreeSet<NodeId>, graph: &JobGraph) -> JobGraph {
    let mut result = JobGraph::new();
    let mut stack: Vec<&NodeId> = targets.iter().collect();

    while let Some(id) = stack.pop() {
        if result.contains_key(id) {
            continue;
        }
        let Some(node) = graph.get(id) else {
            continue;
        };
        result.insert(id.clone(), node.clone());

        for input in node.inputs.values() {
            if let Some(src) = input.source_node() {
                if !result.contains_key(src) {
                    stack.push(src);
                }
            }
        }
    }

    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
