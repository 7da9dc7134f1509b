//! Schedule document loader.
//!
//! A schedule document is JSON:
//!
//! ```json
//! {
//!   "settings": {
//!     "intervals": [
//!       { "start": 0, "frequency": 2, "items": ["all"] },
//!       { "start": 10, "end": 20, "frequency": 1, "itemsOrdered": ["bow", "hookshot"] },
//!       { "start": 20, "frequency": 0.5, "weightedItems": { "rupees": 3, "swords": 1 } }
//!     ],
//!     "categories": { "rupees": ["fiftyRupees", "oneHundredRupees"] }
//!   }
//! }
//! ```
//!
//! `categories` may also sit next to `settings`; when both are present the
//! settings-level entries win. Either way they are layered over the built-in
//! table. Weighted maps keep their declaration order, which the weighted
//! draw depends on.

use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use rip_core::{CategoryTable, IntervalSpec, ItemCatalog, RuleSpec, Schedule};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::loaders::{LoadResult, read_file};

/// JSON object decoded as `(key, value)` pairs in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> OrderedMap<V> {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<(String, V)> {
        self.0
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<(String, V)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    // Duplicate keys: last value wins, first position is kept.
                    match entries.iter().position(|(k, _)| *k == key) {
                        Some(at) => entries[at].1 = value,
                        None => entries.push((key, value)),
                    }
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

/// One interval as written in a schedule document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalDocument {
    pub start: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    pub frequency: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_ordered: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighted_items: Option<OrderedMap<f64>>,
}

impl IntervalDocument {
    /// The authored rule. The first non-empty of `items`, `itemsOrdered`,
    /// `weightedItems` is used.
    pub fn rule(&self) -> RuleSpec {
        if let Some(items) = self.items.as_ref().filter(|items| !items.is_empty()) {
            RuleSpec::Pool(items.clone())
        } else if let Some(items) = self.items_ordered.as_ref().filter(|items| !items.is_empty()) {
            RuleSpec::Ordered(items.clone())
        } else if let Some(weights) = self.weighted_items.as_ref().filter(|w| !w.is_empty()) {
            RuleSpec::Weighted(weights.0.clone())
        } else {
            RuleSpec::Unspecified
        }
    }

    pub fn to_spec(&self) -> IntervalSpec {
        IntervalSpec {
            start: self.start,
            end: self.end,
            frequency: self.frequency,
            rule: self.rule(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    pub intervals: Vec<IntervalDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<OrderedMap<Vec<String>>>,
}

/// Top-level schedule document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    pub settings: ScheduleSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<OrderedMap<Vec<String>>>,
}

impl ScheduleDocument {
    /// Categories declared by the document, settings-level entries last.
    pub fn categories(&self) -> CategoryTable {
        let top = self.categories.iter().flat_map(|map| map.0.iter());
        let settings = self.settings.categories.iter().flat_map(|map| map.0.iter());
        CategoryTable::from_entries(
            top.chain(settings)
                .map(|(name, members)| (name.clone(), members.clone())),
        )
    }

    pub fn interval_specs(&self) -> Vec<IntervalSpec> {
        self.settings
            .intervals
            .iter()
            .map(IntervalDocument::to_spec)
            .collect()
    }

    /// Resolves the document against the catalog and built-in categories.
    pub fn resolve(&self, catalog: &ItemCatalog, builtin: &CategoryTable) -> LoadResult<Schedule> {
        let categories = builtin.merged_with(&self.categories());
        let schedule = Schedule::resolve(&self.interval_specs(), catalog, &categories)?;
        Ok(schedule)
    }
}

/// Loader for schedule documents.
pub struct ScheduleLoader;

impl ScheduleLoader {
    /// Parse a schedule document without resolving names.
    pub fn parse(content: &str) -> LoadResult<ScheduleDocument> {
        serde_json::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse schedule JSON: {}", e))
    }

    /// Parse and resolve a schedule document.
    pub fn load_str(
        content: &str,
        catalog: &ItemCatalog,
        builtin: &CategoryTable,
    ) -> LoadResult<Schedule> {
        let document = Self::parse(content)?;
        document
            .resolve(catalog, builtin)
            .map_err(|e| anyhow::anyhow!("Invalid schedule: {}", e))
    }

    pub fn load(path: &Path, catalog: &ItemCatalog, builtin: &CategoryTable) -> LoadResult<Schedule> {
        let content = read_file(path)?;
        Self::load_str(&content, catalog, builtin)
            .map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }
}

#[cfg(test)]
mod tests {
    use rip_core::{ItemId, ItemInfo, ItemRef, Rule, SpritePos};

    use super::*;

    fn catalog() -> ItemCatalog {
        ItemCatalog::new(
            ["bow", "hookshot", "fireRod", "iceRod"]
                .iter()
                .enumerate()
                .map(|(i, name)| ItemInfo::new(*name, ItemId(i as u8 + 1), SpritePos::default())),
        )
    }

    fn builtin() -> CategoryTable {
        CategoryTable::from_entries([("rods", vec!["fireRod".to_string(), "iceRod".to_string()])])
    }

    #[test]
    fn weighted_items_keep_document_order() {
        let document = ScheduleLoader::parse(
            r#"{"settings": {"intervals": [
                {"start": 0, "frequency": 1, "weightedItems": {"rods": 3, "bow": 1, "all": 2}}
            ]}}"#,
        )
        .unwrap();

        let RuleSpec::Weighted(weights) = document.settings.intervals[0].rule() else {
            panic!("expected weighted rule");
        };
        let names: Vec<_> = weights.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["rods", "bow", "all"]);
    }

    #[test]
    fn first_non_empty_rule_wins() {
        let document = ScheduleLoader::parse(
            r#"{"settings": {"intervals": [
                {"start": 0, "frequency": 1, "items": [], "itemsOrdered": ["bow"]},
                {"start": 1, "frequency": 1}
            ]}}"#,
        )
        .unwrap();

        let intervals = &document.settings.intervals;
        assert_eq!(intervals[0].rule(), RuleSpec::Ordered(vec!["bow".into()]));
        assert_eq!(intervals[1].rule(), RuleSpec::Unspecified);
    }

    #[test]
    fn document_categories_override_builtin() {
        let schedule = ScheduleLoader::load_str(
            r#"{
                "categories": {"rods": ["bow"], "grab": ["hookshot"]},
                "settings": {
                    "intervals": [{"start": 0, "frequency": 1, "items": ["rods", "grab"]}],
                    "categories": {"rods": ["iceRod"]}
                }
            }"#,
            &catalog(),
            &builtin(),
        )
        .unwrap();

        let Rule::Pool(pool) = &schedule.intervals()[0].rule else {
            panic!("expected pool rule");
        };
        assert_eq!(
            pool[0],
            ItemRef::Category {
                name: "rods".into(),
                members: vec!["iceRod".into()],
            }
        );
        assert_eq!(pool[1].name(), "grab");
    }

    #[test]
    fn unknown_names_are_load_errors() {
        let err = ScheduleLoader::load_str(
            r#"{"settings": {"intervals": [{"start": 0, "frequency": 1, "items": ["boots"]}]}}"#,
            &catalog(),
            &builtin(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("boots"));
    }

    #[test]
    fn malformed_json_is_a_load_error() {
        assert!(ScheduleLoader::parse("{\"settings\": ").is_err());
        assert!(ScheduleLoader::parse("{\"intervals\": []}").is_err());
    }
}
