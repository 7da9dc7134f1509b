//! Resolved references to items, categories, or the wildcard.

use crate::catalog::ItemCatalog;
use crate::category::CategoryTable;
use crate::error::{Result, ScheduleError};

/// Name that expands to every item in the catalog.
pub const WILDCARD: &str = "all";

/// A schedule entry after name resolution.
///
/// Names are classified once, when the schedule is loaded. Categories carry
/// their flattened member list so a draw never has to look anything up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemRef {
    Item(String),
    Category { name: String, members: Vec<String> },
    Wildcard,
}

impl ItemRef {
    /// Classifies `name`.
    ///
    /// Categories shadow items of the same name, and both shadow `all`.
    pub fn resolve(name: &str, catalog: &ItemCatalog, categories: &CategoryTable) -> Result<Self> {
        if categories.contains(name) {
            let members = categories.flatten(name, catalog)?;
            Ok(Self::Category {
                name: name.to_string(),
                members,
            })
        } else if catalog.contains(name) {
            Ok(Self::Item(name.to_string()))
        } else if name == WILDCARD {
            if catalog.is_empty() {
                return Err(ScheduleError::EmptyCatalog);
            }
            Ok(Self::Wildcard)
        } else {
            Err(ScheduleError::UnknownItem {
                name: name.to_string(),
            })
        }
    }

    /// Name as written in the configuration.
    pub fn name(&self) -> &str {
        match self {
            Self::Item(name) => name,
            Self::Category { name, .. } => name,
            Self::Wildcard => WILDCARD,
        }
    }
}
