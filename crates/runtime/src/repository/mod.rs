//! Repository layer for data that outlives a process.
//!
//! Repositories hold what a restart must not lose:
//! - Run records (seed and schedule name per ROM identity)
//! - Named schedule configurations (raw document text)
//!
//! Static content (catalog, categories) comes from `rip-content`, and the
//! queue and history are rebuilt from the device on every pass.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::{FileConfigRepository, FileRunRepository};
pub use memory::{InMemoryConfigRepository, InMemoryRunRepository};
pub use traits::{ConfigRepository, RunRepository};
