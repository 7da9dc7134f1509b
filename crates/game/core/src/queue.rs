//! Delivery queue entries and item history.

use std::collections::HashSet;
use std::fmt;

/// Globally monotonic, 1-based position of a slot in the flattened schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EventIndex(pub u16);

impl EventIndex {
    pub const ZERO: EventIndex = EventIndex(0);

    pub const fn from_bytes(hi: u8, lo: u8) -> Self {
        Self(u16::from_be_bytes([hi, lo]))
    }

    /// `[hi, lo]` as stored in device memory.
    pub const fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for EventIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An item bound to its event index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueEntry {
    pub item: String,
    pub index: EventIndex,
}

impl QueueEntry {
    pub fn new(item: impl Into<String>, index: EventIndex) -> Self {
        Self {
            item: item.into(),
            index,
        }
    }
}

/// Every entry computed as due, unique by event index, in insertion order.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(from = "Vec<QueueEntry>", into = "Vec<QueueEntry>")
)]
pub struct ItemHistory {
    entries: Vec<QueueEntry>,
    seen: HashSet<EventIndex>,
}

impl PartialEq for ItemHistory {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for ItemHistory {}

impl From<Vec<QueueEntry>> for ItemHistory {
    fn from(entries: Vec<QueueEntry>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<ItemHistory> for Vec<QueueEntry> {
    fn from(history: ItemHistory) -> Self {
        history.entries
    }
}

impl ItemHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `entry` unless its index is already present.
    ///
    /// Returns `true` when the entry was added.
    pub fn record(&mut self, entry: QueueEntry) -> bool {
        if self.contains_index(entry.index) {
            return false;
        }
        self.seen.insert(entry.index);
        self.entries.push(entry);
        true
    }

    pub fn contains_index(&self, index: EventIndex) -> bool {
        self.seen.contains(&index)
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Entries ordered by event index.
    pub fn sorted(&self) -> Vec<QueueEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by_key(|entry| entry.index);
        sorted
    }

    pub fn indices(&self) -> Vec<u16> {
        self.entries.iter().map(|entry| entry.index.get()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.seen.clear();
    }
}

impl FromIterator<QueueEntry> for ItemHistory {
    fn from_iter<I: IntoIterator<Item = QueueEntry>>(iter: I) -> Self {
        let mut history = Self::new();
        for entry in iter {
            history.record(entry);
        }
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_dedups_by_index() {
        let mut history = ItemHistory::new();
        assert!(history.record(QueueEntry::new("bow", EventIndex(1))));
        assert!(!history.record(QueueEntry::new("bombs", EventIndex(1))));
        assert!(history.record(QueueEntry::new("bombs", EventIndex(2))));
        assert_eq!(history.indices(), [1, 2]);
        assert_eq!(history.entries()[0].item, "bow");
    }

    #[test]
    fn event_index_byte_order() {
        let index = EventIndex(0x0102);
        assert_eq!(index.to_bytes(), [0x01, 0x02]);
        assert_eq!(EventIndex::from_bytes(0x01, 0x02), index);
        assert_eq!(EventIndex(0x00FF).next(), EventIndex(0x0100));
    }
}
