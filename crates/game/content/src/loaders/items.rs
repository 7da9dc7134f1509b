//! Item catalog loader.

use std::path::Path;

use rip_core::{ItemCatalog, ItemId, ItemInfo, SpritePos};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// One catalog row as written in RON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEntry {
    pub name: String,
    pub id: u8,
    pub row: u8,
    pub col: u8,
}

impl From<ItemEntry> for ItemInfo {
    fn from(entry: ItemEntry) -> Self {
        ItemInfo::new(
            entry.name,
            ItemId(entry.id),
            SpritePos {
                row: entry.row,
                col: entry.col,
            },
        )
    }
}

/// Item catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ItemFile {
    items: Vec<ItemEntry>,
}

/// Loader for the item catalog.
pub struct ItemLoader;

impl ItemLoader {
    /// Load the item catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<ItemCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse item catalog RON at {}: {}", path.display(), e))
    }

    /// Parse an item catalog from RON text.
    pub fn parse(content: &str) -> LoadResult<ItemCatalog> {
        let file: ItemFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse item catalog RON: {}", e))?;
        if file.items.is_empty() {
            anyhow::bail!("item catalog is empty");
        }
        Ok(ItemCatalog::new(file.items.into_iter().map(ItemInfo::from)))
    }
}
