//! Interval-based delivery schedules.
//!
//! A schedule is authored as a list of [`IntervalSpec`]s that name items by
//! string. [`Schedule::resolve`] classifies every name once against the
//! catalog and category table, producing [`Interval`]s whose rules hold
//! [`ItemRef`]s.

use crate::catalog::ItemCatalog;
use crate::category::CategoryTable;
use crate::error::{Result, ScheduleError};
use crate::item_ref::ItemRef;

/// End (in minutes) given to the last interval.
pub const END_SENTINEL: f64 = 9999.0;

/// Frequency substituted for non-positive frequencies.
pub const MIN_FREQUENCY: f64 = 0.1;

/// Selection rule as authored, before name resolution.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RuleSpec {
    /// Draw uniformly from the pool.
    Pool(Vec<String>),
    /// Cycle through the list in order.
    Ordered(Vec<String>),
    /// Draw by weight; order is the declaration order.
    Weighted(Vec<(String, f64)>),
    /// No rule given; behaves as a pool of `all`.
    #[default]
    Unspecified,
}

/// One interval as authored.
#[derive(Clone, Debug, PartialEq)]
pub struct IntervalSpec {
    pub start: f64,
    pub end: Option<f64>,
    pub frequency: f64,
    pub rule: RuleSpec,
}

/// Resolved selection rule.
///
/// Loaded schedules never carry an empty list; one built by hand that does
/// draws from the whole catalog.
#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    Pool(Vec<ItemRef>),
    Ordered(Vec<ItemRef>),
    Weighted(Vec<(ItemRef, f64)>),
}

impl Rule {
    /// Rule used when an interval declares no non-empty rule.
    pub fn wildcard() -> Self {
        Rule::Pool(vec![ItemRef::Wildcard])
    }
}

/// Resolved interval.
#[derive(Clone, Debug, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end: Option<f64>,
    pub frequency: f64,
    pub rule: Rule,
}

impl Interval {
    pub fn new(start: f64, frequency: f64, rule: Rule) -> Self {
        Self {
            start,
            end: None,
            frequency,
            rule,
        }
    }

    pub fn with_end(mut self, end: f64) -> Self {
        self.end = Some(end);
        self
    }

    /// Frequency clamped to a positive value.
    pub fn effective_frequency(&self) -> f64 {
        if self.frequency > 0.0 {
            self.frequency
        } else {
            MIN_FREQUENCY
        }
    }
}

/// A resolved schedule.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schedule {
    intervals: Vec<Interval>,
}

impl Schedule {
    pub fn new(intervals: Vec<Interval>) -> Self {
        Self { intervals }
    }

    /// Resolves authored intervals against the catalog and categories.
    ///
    /// An empty rule list falls back to the wildcard pool, and when several
    /// rules are given the first non-empty one of pool, ordered, weighted
    /// wins.
    pub fn resolve(
        specs: &[IntervalSpec],
        catalog: &ItemCatalog,
        categories: &CategoryTable,
    ) -> Result<Self> {
        let resolve_names = |names: &[String]| -> Result<Vec<ItemRef>> {
            names
                .iter()
                .map(|name| ItemRef::resolve(name, catalog, categories))
                .collect()
        };

        let mut intervals = Vec::with_capacity(specs.len());
        for (index, spec) in specs.iter().enumerate() {
            let rule = match &spec.rule {
                RuleSpec::Pool(names) if !names.is_empty() => Rule::Pool(resolve_names(names)?),
                RuleSpec::Ordered(names) if !names.is_empty() => {
                    Rule::Ordered(resolve_names(names)?)
                }
                RuleSpec::Weighted(weights) if !weights.is_empty() => {
                    let mut resolved = Vec::with_capacity(weights.len());
                    for (name, weight) in weights {
                        if !weight.is_finite() || *weight < 0.0 {
                            return Err(ScheduleError::InvalidWeight {
                                index,
                                name: name.clone(),
                                weight: *weight,
                            });
                        }
                        resolved.push((ItemRef::resolve(name, catalog, categories)?, *weight));
                    }
                    if resolved.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
                        return Err(ScheduleError::ZeroTotalWeight { index });
                    }
                    Rule::Weighted(resolved)
                }
                _ => {
                    if catalog.is_empty() {
                        return Err(ScheduleError::EmptyCatalog);
                    }
                    Rule::wildcard()
                }
            };
            intervals.push(Interval {
                start: spec.start,
                end: spec.end,
                frequency: spec.frequency,
                rule,
            });
        }

        Ok(Self { intervals })
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Intervals sorted by start, with ends derived and frequencies clamped.
    ///
    /// An interval without an explicit end ends where the next one starts;
    /// the last interval always runs to [`END_SENTINEL`].
    pub fn normalized(&self) -> Vec<Interval> {
        let mut sorted = self.intervals.clone();
        sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

        let starts: Vec<f64> = sorted.iter().map(|interval| interval.start).collect();
        let last = sorted.len().saturating_sub(1);
        for (index, interval) in sorted.iter_mut().enumerate() {
            interval.frequency = interval.effective_frequency();
            if index == last {
                interval.end = Some(END_SENTINEL);
            } else if interval.end.is_none() {
                interval.end = Some(starts[index + 1]);
            }
        }
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemId, ItemInfo, SpritePos};

    fn catalog() -> ItemCatalog {
        ItemCatalog::new([
            ItemInfo::new("bow", ItemId(1), SpritePos::default()),
            ItemInfo::new("bombs", ItemId(2), SpritePos::default()),
        ])
    }

    fn spec(start: f64, frequency: f64, rule: RuleSpec) -> IntervalSpec {
        IntervalSpec {
            start,
            end: None,
            frequency,
            rule,
        }
    }

    #[test]
    fn empty_rules_fall_back_to_wildcard() {
        let specs = [
            spec(0.0, 1.0, RuleSpec::Pool(Vec::new())),
            spec(5.0, 1.0, RuleSpec::Unspecified),
        ];
        let schedule = Schedule::resolve(&specs, &catalog(), &CategoryTable::new()).unwrap();
        for interval in schedule.intervals() {
            assert_eq!(interval.rule, Rule::wildcard());
        }
    }

    #[test]
    fn weighted_rule_keeps_declaration_order() {
        let specs = [spec(
            0.0,
            1.0,
            RuleSpec::Weighted(vec![("bombs".into(), 3.0), ("bow".into(), 1.0)]),
        )];
        let schedule = Schedule::resolve(&specs, &catalog(), &CategoryTable::new()).unwrap();
        let Rule::Weighted(weights) = &schedule.intervals()[0].rule else {
            panic!("expected weighted rule");
        };
        assert_eq!(weights[0].0.name(), "bombs");
        assert_eq!(weights[1].0.name(), "bow");
    }

    #[test]
    fn zero_total_weight_is_rejected() {
        let specs = [spec(
            0.0,
            1.0,
            RuleSpec::Weighted(vec![("bombs".into(), 0.0)]),
        )];
        assert_eq!(
            Schedule::resolve(&specs, &catalog(), &CategoryTable::new()),
            Err(ScheduleError::ZeroTotalWeight { index: 0 })
        );
    }

    #[test]
    fn normalized_sorts_and_derives_ends() {
        let schedule = Schedule::new(vec![
            Interval::new(10.0, 2.0, Rule::wildcard()),
            Interval::new(0.0, 0.0, Rule::wildcard()),
            Interval::new(4.0, 1.0, Rule::wildcard()).with_end(6.0),
        ]);
        let normalized = schedule.normalized();

        let starts: Vec<f64> = normalized.iter().map(|i| i.start).collect();
        assert_eq!(starts, [0.0, 4.0, 10.0]);
        assert_eq!(normalized[0].end, Some(4.0));
        assert_eq!(normalized[0].frequency, MIN_FREQUENCY);
        assert_eq!(normalized[1].end, Some(6.0));
        assert_eq!(normalized[2].end, Some(END_SENTINEL));
    }
}
