//! Boundary with the external execution engine.
//!
//! HTTP API client (submission, queue status, cache channel control),
//! the [`EngineTransport`](transport::EngineTransport) trait the
//! scheduler programs against, the polling completion monitor, and the
//! WebSocket event listener with automatic reconnection.

pub mod api;
pub mod client;
pub mod messages;
pub mod monitor;
pub mod transport;
