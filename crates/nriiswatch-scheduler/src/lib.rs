//! Orchestration: the single-flight polling workflow, the alarm loop
//! that drives it, and the message bridge that answers UI queries.

pub mod alarms;
pub mod bridge;
pub mod workflow;

pub use alarms::Trigger;
pub use workflow::Watcher;
