//! Domain types and pure algorithms for the groupflow orchestrator.
//!
//! This crate has zero internal deps so it can be used by the engine
//! boundary, the scheduler, and any future CLI or worker tooling.

pub mod canvas;
pub mod graph;
pub mod list;
pub mod ordering;
pub mod types;
