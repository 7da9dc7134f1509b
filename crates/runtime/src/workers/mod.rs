//! Worker tasks that back the runtime orchestration.
//!
//! The discovery worker keeps a device selected; the session worker refreshes
//! snapshots, runs the scheduler, triggers drains, and executes commands
//! from [`RuntimeHandle`](crate::RuntimeHandle).

mod discovery;
mod session;

pub use discovery::DiscoveryWorker;
pub use session::{Command, SessionContext, SessionWorker};
