//! Built-in category loader.

use std::path::Path;

use rip_core::CategoryTable;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoryEntry {
    name: String,
    members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoryFile {
    categories: Vec<CategoryEntry>,
}

/// Loader for category tables from RON files.
pub struct CategoryLoader;

impl CategoryLoader {
    pub fn load(path: &Path) -> LoadResult<CategoryTable> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse categories RON at {}: {}", path.display(), e)
        })
    }

    pub fn parse(content: &str) -> LoadResult<CategoryTable> {
        let file: CategoryFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse categories RON: {}", e))?;
        Ok(CategoryTable::from_entries(
            file.categories
                .into_iter()
                .map(|entry| (entry.name, entry.members)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_duplicate_replaces_earlier() {
        let table = CategoryLoader::parse(
            r#"(categories: [
                (name: "rods", members: ["fireRod"]),
                (name: "canes", members: ["caneOfSomaria"]),
                (name: "rods", members: ["fireRod", "iceRod"]),
            ])"#,
        )
        .unwrap();

        assert_eq!(table.names().collect::<Vec<_>>(), ["rods", "canes"]);
        assert_eq!(table.members("rods").unwrap(), ["fireRod", "iceRod"]);
    }
}
