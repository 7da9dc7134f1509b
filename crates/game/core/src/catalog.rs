//! Static item catalog.
//!
//! Every deliverable item has a one-byte identifier (the value the device
//! expects in the ack record) and a cell on the sprite sheet used by
//! presentation layers. The catalog preserves declaration order: expanding
//! the wildcard draws from the catalog in that order, so reordering the data
//! file changes which item a given draw lands on.

use std::collections::HashMap;

/// Device-side identifier of an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(pub u8);

impl ItemId {
    /// Raw byte written to device memory.
    pub const fn byte(self) -> u8 {
        self.0
    }
}

/// Cell on the item sprite sheet (row, column), counted from the sheet's
/// bottom-right corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpritePos {
    pub row: u8,
    pub col: u8,
}

impl SpritePos {
    pub const CELL_SIZE: u32 = 16;
    pub const SHEET_COLUMNS: u32 = 20;
    pub const SHEET_ROWS: u32 = 9;

    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Pixel offset `(x, y)` of this cell on the sprite sheet.
    pub fn pixel_offset(self) -> (i64, i64) {
        let x = (Self::SHEET_COLUMNS as i64 - self.col as i64) * Self::CELL_SIZE as i64;
        let y = (Self::SHEET_ROWS as i64 - self.row as i64) * Self::CELL_SIZE as i64;
        (x, y)
    }
}

/// Catalog entry for a single item.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemInfo {
    pub name: String,
    pub id: ItemId,
    pub sprite: SpritePos,
}

impl ItemInfo {
    pub fn new(name: impl Into<String>, id: ItemId, sprite: SpritePos) -> Self {
        Self {
            name: name.into(),
            id,
            sprite,
        }
    }
}

/// Ordered, read-only item catalog with name lookup.
#[derive(Clone, Debug, Default)]
pub struct ItemCatalog {
    items: Vec<ItemInfo>,
    by_name: HashMap<String, usize>,
}

impl ItemCatalog {
    /// Builds a catalog from entries in declaration order.
    ///
    /// A later entry with a duplicate name replaces the earlier one in place,
    /// keeping the earlier position.
    pub fn new(entries: impl IntoIterator<Item = ItemInfo>) -> Self {
        let mut catalog = Self::default();
        for entry in entries {
            match catalog.by_name.get(&entry.name) {
                Some(&index) => catalog.items[index] = entry,
                None => {
                    catalog.by_name.insert(entry.name.clone(), catalog.items.len());
                    catalog.items.push(entry);
                }
            }
        }
        catalog
    }

    pub fn get(&self, name: &str) -> Option<&ItemInfo> {
        self.by_name.get(name).map(|&index| &self.items[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Device identifier for an item name.
    pub fn id_of(&self, name: &str) -> Option<ItemId> {
        self.get(name).map(|info| info.id)
    }

    /// Item names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|info| info.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemInfo> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ItemCatalog {
        ItemCatalog::new([
            ItemInfo::new("bow", ItemId(0x0B), SpritePos::new(1, 1)),
            ItemInfo::new("hookshot", ItemId(0x0A), SpritePos::new(1, 2)),
            ItemInfo::new("bombs", ItemId(0x31), SpritePos::new(2, 1)),
        ])
    }

    #[test]
    fn preserves_declaration_order() {
        let catalog = sample();
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(names, ["bow", "hookshot", "bombs"]);
    }

    #[test]
    fn duplicate_name_replaces_in_place() {
        let catalog = ItemCatalog::new([
            ItemInfo::new("bow", ItemId(1), SpritePos::default()),
            ItemInfo::new("hookshot", ItemId(2), SpritePos::default()),
            ItemInfo::new("bow", ItemId(3), SpritePos::default()),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.id_of("bow"), Some(ItemId(3)));
        assert_eq!(catalog.names().next(), Some("bow"));
    }

    #[test]
    fn sprite_offset_counts_from_sheet_corner() {
        assert_eq!(SpritePos::new(9, 20).pixel_offset(), (0, 0));
        assert_eq!(SpritePos::new(8, 19).pixel_offset(), (16, 16));
    }
}
