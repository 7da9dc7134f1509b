//! Content loaders for reading built-in data and user schedules.
//!
//! Built-in data is RON; schedule documents are JSON.

pub mod categories;
pub mod factory;
pub mod items;
pub mod schedule;

pub use categories::CategoryLoader;
pub use factory::{Content, ContentFactory};
pub use items::{ItemEntry, ItemLoader};
pub use schedule::{IntervalDocument, OrderedMap, ScheduleDocument, ScheduleLoader, ScheduleSettings};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
