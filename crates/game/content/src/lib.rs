//! Data-driven content and loaders.
//!
//! This crate ships the built-in item catalog and category table as RON data
//! files and provides loaders for them, plus the loader for user-authored
//! JSON schedule documents:
//! - Item catalog (name, device identifier, sprite position)
//! - Built-in categories
//! - Schedule documents (`{settings: {intervals, categories?}}`)
//!
//! Everything here resolves to `rip-core` types; nothing in this crate talks
//! to a device.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    CategoryLoader, Content, ContentFactory, IntervalDocument, ItemEntry, ItemLoader, LoadResult,
    OrderedMap, ScheduleDocument, ScheduleLoader, ScheduleSettings,
};
