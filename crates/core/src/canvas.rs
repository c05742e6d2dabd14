//! Canvas document model and the collaborator query trait.
//!
//! The scheduler never inspects geometry itself; it asks a
//! [`GraphModel`] which nodes belong to a group and whether they are
//! eligible for submission. [`CanvasModel`] is the shipped
//! implementation, backed by the canvas document the editor exports
//! (nodes with positions, sizes and modes, plus named groups with
//! bounding rectangles, plus the executable graph snapshot).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::graph::JobGraph;
use crate::types::NodeId;

// ---------------------------------------------------------------------------
// Node mode constants
// ---------------------------------------------------------------------------

/// Execution modes a canvas node can be in.
pub mod modes {
    /// Normal execution.
    pub const ALWAYS: u8 = 0;
    /// Muted: the node never runs.
    pub const MUTED: u8 = 2;
    /// Bypassed: inputs are routed around the node.
    pub const BYPASSED: u8 = 4;

    /// Whether a node in this mode participates in execution.
    pub fn is_active(mode: u8) -> bool {
        mode == ALWAYS
    }
}

// ---------------------------------------------------------------------------
// Output type constants
// ---------------------------------------------------------------------------

/// Node types that produce external output (files on disk, previews).
///
/// Only these count as submission targets when a group is resolved.
pub mod output_types {
    pub const SAVE_IMAGE: &str = "SaveImage";
    pub const PREVIEW_IMAGE: &str = "PreviewImage";
    pub const SAVE_VIDEO: &str = "SaveVideo";
    pub const SAVE_AUDIO: &str = "SaveAudio";
    pub const CACHE_WRITE: &str = "CacheWrite";

    /// All recognised output node types.
    pub const ALL: &[&str] = &[
        SAVE_IMAGE,
        PREVIEW_IMAGE,
        SAVE_VIDEO,
        SAVE_AUDIO,
        CACHE_WRITE,
    ];

    /// Check whether a node type produces external output.
    pub fn is_output(node_type: &str) -> bool {
        ALL.contains(&node_type)
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle, `[x, y, width, height]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds(pub [f64; 4]);

impl Bounds {
    /// Whether the point `(x, y)` lies inside this rectangle.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let [bx, by, w, h] = self.0;
        x >= bx && x <= bx + w && y >= by && y <= by + h
    }
}

// ---------------------------------------------------------------------------
// Canvas document
// ---------------------------------------------------------------------------

/// A node as laid out on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    /// Matches the node's id in the executable graph.
    pub id: NodeId,

    /// Engine node type.
    #[serde(rename = "type")]
    pub node_type: String,

    /// Top-left corner, canvas coordinates.
    pub pos: [f64; 2],

    /// Width and height in canvas units.
    pub size: [f64; 2],

    /// Execution mode (see [`modes`]).
    #[serde(default)]
    pub mode: u8,
}

impl CanvasNode {
    /// Geometric center of the node's bounding box.
    ///
    /// A node belongs to a group when its center lies inside the
    /// group's bounds, so a node straddling a group border is counted
    /// exactly once.
    pub fn center(&self) -> (f64, f64) {
        (
            self.pos[0] + self.size[0] / 2.0,
            self.pos[1] + self.size[1] / 2.0,
        )
    }
}

/// A named group drawn on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasGroup {
    /// Group name; unique within one execution list.
    pub title: String,

    /// Bounding rectangle of the group.
    pub bounding: Bounds,
}

/// The full canvas document: layout, groups, and the executable
/// snapshot the editor exported alongside them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasModel {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,

    #[serde(default)]
    pub groups: Vec<CanvasGroup>,

    /// Immutable submission snapshot matching the layout above.
    #[serde(default)]
    pub job_graph: JobGraph,
}

impl CanvasModel {
    /// Parse a canvas document from its JSON export.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    fn node(&self, node_id: &str) -> Option<&CanvasNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }
}

// ---------------------------------------------------------------------------
// Collaborator query trait
// ---------------------------------------------------------------------------

/// Queries the scheduler needs answered about the live graph.
///
/// Implemented by the canvas document here and by hand-built fixtures
/// in scheduler tests. Geometry never leaks past this trait.
pub trait GraphModel {
    /// Ids of all nodes whose bounds fall inside the named group's
    /// bounds. Empty when the group does not exist.
    fn nodes_in_group_bounds(&self, group_name: &str) -> BTreeSet<NodeId>;

    /// Whether the node produces external output.
    fn is_output_node(&self, node_id: &str) -> bool;

    /// Whether the node is in an active (non-muted, non-bypassed)
    /// execution mode.
    fn is_node_active(&self, node_id: &str) -> bool;

    /// The immutable executable snapshot for the next submission.
    fn job_graph(&self) -> JobGraph;
}

impl GraphModel for CanvasModel {
    fn nodes_in_group_bounds(&self, group_name: &str) -> BTreeSet<NodeId> {
        let Some(group) = self.groups.iter().find(|g| g.title == group_name) else {
            return BTreeSet::new();
        };
        self.nodes
            .iter()
            .filter(|n| {
                let (cx, cy) = n.center();
                group.bounding.contains_point(cx, cy)
            })
            .map(|n| n.id.clone())
            .collect()
    }

    fn is_output_node(&self, node_id: &str) -> bool {
        self.node(node_id)
            .map(|n| output_types::is_output(&n.node_type))
            .unwrap_or(false)
    }

    fn is_node_active(&self, node_id: &str) -> bool {
        self.node(node_id)
            .map(|n| modes::is_active(n.mode))
            .unwrap_or(false)
    }

    fn job_graph(&self) -> JobGraph {
        self.job_graph.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
