//! Sequential group execution orchestrator.
//!
//! Composes the submission interceptor, cache channel coordinator,
//! completion monitor, and reentrancy lock into the
//! [`GroupScheduler`](scheduler::GroupScheduler) state machine that
//! executes an ordered list of groups against the engine, one at a
//! time, with inter-group delays and group-scoped cache routing.

pub mod channel;
pub mod interceptor;
pub mod lock;
pub mod scheduler;
pub mod status;
