//! Errors raised while resolving schedules against the catalog.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("`{name}` is not an item, a category, or `all`")]
    UnknownItem { name: String },

    #[error("category `{name}` refers to itself through `{via}`")]
    CategoryCycle { name: String, via: String },

    #[error("category `{name}` expands to no items")]
    EmptyCategory { name: String },

    #[error("interval {index} has an invalid weight {weight} for `{name}`")]
    InvalidWeight {
        index: usize,
        name: String,
        weight: f64,
    },

    #[error("interval {index} has weights summing to zero")]
    ZeroTotalWeight { index: usize },

    #[error("item catalog is empty")]
    EmptyCatalog,
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
