//! Content factory for building the catalog and category table.

use std::path::{Path, PathBuf};

use rip_core::{CategoryTable, ItemCatalog, Schedule};

use crate::loaders::{CategoryLoader, ItemLoader, LoadResult, ScheduleLoader};

const BUILTIN_ITEMS: &str = include_str!("../../data/items.ron");
const BUILTIN_CATEGORIES: &str = include_str!("../../data/categories.ron");

/// Static content every schedule is resolved against.
#[derive(Clone, Debug, Default)]
pub struct Content {
    pub catalog: ItemCatalog,
    pub categories: CategoryTable,
}

impl Content {
    /// Content compiled into the crate.
    pub fn builtin() -> LoadResult<Self> {
        Ok(Self {
            catalog: ItemLoader::parse(BUILTIN_ITEMS)?,
            categories: CategoryLoader::parse(BUILTIN_CATEGORIES)?,
        })
    }

    /// Parses and resolves a schedule document against this content.
    pub fn schedule(&self, document: &str) -> LoadResult<Schedule> {
        ScheduleLoader::load_str(document, &self.catalog, &self.categories)
    }
}

/// Content factory that loads content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── items.ron        (optional, replaces the built-in catalog)
/// └── categories.ron   (optional, layered over the built-in categories)
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load the item catalog from `items.ron`, or the built-in one if absent.
    pub fn load_items(&self) -> LoadResult<ItemCatalog> {
        let path = self.data_dir.join("items.ron");
        if path.exists() {
            ItemLoader::load(&path)
        } else {
            ItemLoader::parse(BUILTIN_ITEMS)
        }
    }

    /// Built-in categories with `categories.ron` layered on top, if present.
    pub fn load_categories(&self) -> LoadResult<CategoryTable> {
        let builtin = CategoryLoader::parse(BUILTIN_CATEGORIES)?;
        let path = self.data_dir.join("categories.ron");
        if path.exists() {
            Ok(builtin.merged_with(&CategoryLoader::load(&path)?))
        } else {
            Ok(builtin)
        }
    }

    pub fn load(&self) -> LoadResult<Content> {
        Ok(Content {
            catalog: self.load_items()?,
            categories: self.load_categories()?,
        })
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use rip_core::{ItemId, ItemRef, WILDCARD};

    use super::*;

    #[test]
    fn builtin_content_is_consistent() {
        let content = Content::builtin().unwrap();
        assert_eq!(content.catalog.id_of("hookshot"), Some(ItemId(0x0A)));
        assert_eq!(content.catalog.id_of("bow"), Some(ItemId(0x0B)));

        // Every built-in category flattens to catalog items.
        for name in content.categories.names() {
            let members = content.categories.flatten(name, &content.catalog).unwrap();
            assert!(members.iter().all(|member| content.catalog.contains(member)));
        }
    }

    #[test]
    fn nested_builtin_categories_flatten() {
        let content = Content::builtin().unwrap();
        let junk = ItemRef::resolve("junk", &content.catalog, &content.categories).unwrap();
        let ItemRef::Category { members, .. } = junk else {
            panic!("expected category");
        };
        assert!(members.contains(&"tenBombs".to_string()));
        assert!(members.contains(&"fiftyRupees".to_string()));
    }

    #[test]
    fn builtin_schedule_resolves_wildcard() {
        let content = Content::builtin().unwrap();
        let schedule = content
            .schedule(r#"{"settings": {"intervals": [{"start": 0, "frequency": 2, "items": ["all"]}]}}"#)
            .unwrap();
        assert_eq!(schedule.intervals().len(), 1);
        assert!(content.catalog.contains("fairy"));
        assert!(!content.categories.contains(WILDCARD));
    }

    #[test]
    fn data_dir_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("categories.ron"),
            r#"(categories: [(name: "rods", members: ["iceRod"]), (name: "mine", members: ["bow"])])"#,
        )
        .unwrap();

        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.data_dir(), dir.path());
        let content = factory.load().unwrap();
        assert_eq!(content.categories.members("rods").unwrap(), ["iceRod"]);
        assert!(content.categories.contains("mine"));
        assert!(content.categories.contains("swords"));
        // No items.ron: the built-in catalog is used.
        assert!(content.catalog.contains("moonPearl"));
    }
}
