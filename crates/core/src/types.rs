//! Shared type aliases.

/// Identifier of a node in a job graph.
///
/// The engine addresses nodes by opaque strings. Most graphs use decimal
/// integers ("5", "12") but nothing guarantees it, so ids stay strings
/// end to end.
pub type NodeId = String;
