//! Background Tasks Module
//!
//! Work that runs on the tokio runtime alongside the caller.
//!
//! # Tasks
//! - Expiry sweep: removes expired cache records at a fixed interval
//! - Operations: one API client call with a single terminal outcome

mod cleanup;
mod operation;

pub use cleanup::spawn_cleanup_task;
pub use operation::{spawn_operation, TaskCallbacks, TaskHandle, TaskOutcome};
