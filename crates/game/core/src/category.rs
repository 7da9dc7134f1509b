//! Category table: named groups of items.
//!
//! Built-in categories ship with the content crate; a configuration may add
//! its own or replace a built-in one by reusing its name. Members may name
//! items, other categories, or `all`; [`CategoryTable::flatten`] expands
//! them to concrete item names once, when a schedule is loaded.

use std::collections::{HashMap, HashSet};

use crate::catalog::ItemCatalog;
use crate::error::{Result, ScheduleError};
use crate::item_ref::WILDCARD;

/// Named, ordered member lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryTable {
    order: Vec<String>,
    members: HashMap<String, Vec<String>>,
}

impl CategoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(name, members)` pairs in declaration order.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, members) in entries {
            table.insert(name, members);
        }
        table
    }

    /// Inserts or replaces a category. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, members: Vec<String>) {
        let name = name.into();
        if !self.members.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.members.insert(name, members);
    }

    /// Returns a new table with `overrides` layered on top of `self`.
    ///
    /// Entries in `overrides` win on name collision.
    pub fn merged_with(&self, overrides: &CategoryTable) -> CategoryTable {
        let mut merged = self.clone();
        for name in &overrides.order {
            merged.insert(name.clone(), overrides.members[name].clone());
        }
        merged
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Raw (unexpanded) members of a category.
    pub fn members(&self, name: &str) -> Option<&[String]> {
        self.members.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Expands a category to concrete item names, in member order.
    ///
    /// Nested categories are expanded in place and `all` expands to the whole
    /// catalog. Duplicates are kept: listing an item twice doubles its odds.
    pub fn flatten(&self, name: &str, catalog: &ItemCatalog) -> Result<Vec<String>> {
        let mut visiting = HashSet::new();
        let items = self.flatten_inner(name, catalog, &mut visiting)?;
        if items.is_empty() {
            return Err(ScheduleError::EmptyCategory {
                name: name.to_string(),
            });
        }
        Ok(items)
    }

    fn flatten_inner(
        &self,
        name: &str,
        catalog: &ItemCatalog,
        visiting: &mut HashSet<String>,
    ) -> Result<Vec<String>> {
        let members = self
            .members
            .get(name)
            .ok_or_else(|| ScheduleError::UnknownItem {
                name: name.to_string(),
            })?;

        visiting.insert(name.to_string());
        let mut items = Vec::with_capacity(members.len());
        for member in members {
            if self.members.contains_key(member) {
                if visiting.contains(member) {
                    return Err(ScheduleError::CategoryCycle {
                        name: name.to_string(),
                        via: member.clone(),
                    });
                }
                items.extend(self.flatten_inner(member, catalog, visiting)?);
            } else if catalog.contains(member) {
                items.push(member.clone());
            } else if member == WILDCARD {
                items.extend(catalog.names().map(str::to_string));
            } else {
                return Err(ScheduleError::UnknownItem {
                    name: member.clone(),
                });
            }
        }
        visiting.remove(name);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemId, ItemInfo, SpritePos};

    fn catalog() -> ItemCatalog {
        ItemCatalog::new(
            ["bow", "hookshot", "bombs", "arrows"]
                .iter()
                .enumerate()
                .map(|(i, name)| ItemInfo::new(*name, ItemId(i as u8 + 1), SpritePos::default())),
        )
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn overrides_replace_builtin_members() {
        let builtin = CategoryTable::from_entries([
            ("weapons", strings(&["bow"])),
            ("ammo", strings(&["arrows"])),
        ]);
        let config = CategoryTable::from_entries([
            ("weapons", strings(&["hookshot"])),
            ("boom", strings(&["bombs"])),
        ]);

        let merged = builtin.merged_with(&config);
        assert_eq!(merged.members("weapons"), Some(&strings(&["hookshot"])[..]));
        assert_eq!(merged.names().collect::<Vec<_>>(), ["weapons", "ammo", "boom"]);
    }

    #[test]
    fn flatten_expands_nested_and_wildcard() {
        let table = CategoryTable::from_entries([
            ("ammo", strings(&["arrows", "bombs"])),
            ("ranged", strings(&["bow", "ammo"])),
            ("anything", strings(&["all"])),
        ]);
        let catalog = catalog();

        assert_eq!(
            table.flatten("ranged", &catalog).unwrap(),
            strings(&["bow", "arrows", "bombs"])
        );
        assert_eq!(table.flatten("anything", &catalog).unwrap().len(), 4);
    }

    #[test]
    fn flatten_rejects_cycles() {
        let table = CategoryTable::from_entries([
            ("a", strings(&["b"])),
            ("b", strings(&["a"])),
        ]);
        let err = table.flatten("a", &catalog()).unwrap_err();
        assert!(matches!(err, ScheduleError::CategoryCycle { .. }));
    }

    #[test]
    fn flatten_rejects_empty_and_unknown() {
        let table = CategoryTable::from_entries([
            ("empty", Vec::new()),
            ("broken", strings(&["sword"])),
        ]);
        let catalog = catalog();
        assert!(matches!(
            table.flatten("empty", &catalog),
            Err(ScheduleError::EmptyCategory { .. })
        ));
        assert_eq!(
            table.flatten("broken", &catalog),
            Err(ScheduleError::UnknownItem {
                name: "sword".into()
            })
        );
    }
}
