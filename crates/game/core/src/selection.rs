//! Selection policy: turns one schedule slot into a concrete item.
//!
//! Two independent Alea streams take part in every draw:
//!
//! - the **round** stream picks a candidate from the interval's pool
//! - the **primary** stream expands that candidate (category member or
//!   catalog entry) into the final item
//!
//! Both streams advance exactly once per pool resolution, whatever kind of
//! candidate was drawn, so a slot always consumes the same amount of
//! randomness and later slots stay put when one pool entry changes kind.

use crate::catalog::ItemCatalog;
use crate::item_ref::ItemRef;
use crate::rng::Alea;
use crate::schedule::Rule;

/// The pair of generators threaded through a scheduling pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Streams {
    pub primary: Alea,
    pub round: Alea,
}

impl Streams {
    pub fn new(primary_seed: &str, round_seed: &str) -> Self {
        Self {
            primary: Alea::from_seed(primary_seed),
            round: Alea::from_seed(round_seed),
        }
    }
}

/// Drawn from when a rule, pool, or category has nothing to offer.
const WILDCARD_POOL: &[ItemRef] = &[ItemRef::Wildcard];

/// Resolves one slot of `rule`.
///
/// `slot_in_interval` is the 1-based position of the slot inside its
/// interval; only the ordered rule looks at it. A rule with an empty list
/// draws from the whole catalog.
pub fn select(
    rule: &Rule,
    slot_in_interval: u32,
    catalog: &ItemCatalog,
    streams: Streams,
) -> (String, Streams) {
    match rule {
        Rule::Pool(pool) => draw_from_pool(pool, catalog, streams),
        Rule::Ordered(list) if !list.is_empty() => {
            let position = (slot_in_interval.saturating_sub(1) as usize) % list.len();
            draw_from_pool(std::slice::from_ref(&list[position]), catalog, streams)
        }
        Rule::Weighted(weights) => match pick_weighted(weights, streams.primary) {
            Some((picked, primary)) => {
                let streams = Streams { primary, ..streams };
                draw_from_pool(std::slice::from_ref(picked), catalog, streams)
            }
            None => draw_from_pool(WILDCARD_POOL, catalog, streams),
        },
        Rule::Ordered(_) => draw_from_pool(WILDCARD_POOL, catalog, streams),
    }
}

/// Draws a candidate with the round stream, then expands it with the primary
/// stream. An empty pool or category expands like the wildcard.
pub fn draw_from_pool(pool: &[ItemRef], catalog: &ItemCatalog, streams: Streams) -> (String, Streams) {
    let pool = if pool.is_empty() { WILDCARD_POOL } else { pool };
    let (candidate_index, round) = streams.round.next_index(pool.len());
    let (value, primary) = streams.primary.next();
    let streams = Streams { primary, round };

    let item = match &pool[candidate_index] {
        ItemRef::Item(name) => name.clone(),
        ItemRef::Category { members, .. } if !members.is_empty() => {
            members[scale(value, members.len())].clone()
        }
        ItemRef::Category { .. } | ItemRef::Wildcard => catalog
            .names()
            .nth(scale(value, catalog.len()))
            .unwrap_or_default()
            .to_string(),
    };
    (item, streams)
}

/// Walks `weights` in declaration order and returns the first entry whose
/// running total exceeds a draw in `[0, total)`.
///
/// Returns `None` without drawing when `weights` is empty.
pub fn pick_weighted(weights: &[(ItemRef, f64)], primary: Alea) -> Option<(&ItemRef, Alea)> {
    let (last, _) = weights.last()?;
    let total: f64 = weights.iter().map(|(_, weight)| weight).sum();
    let (value, primary) = primary.next();
    let target = value * total;

    let mut running = 0.0;
    for (item, weight) in weights {
        running += weight;
        if target < running {
            return Some((item, primary));
        }
    }

    // Rounding can leave `target` a hair above the final running total.
    let fallback = weights
        .iter()
        .rev()
        .find(|(_, weight)| *weight > 0.0)
        .map_or(last, |(item, _)| item);
    Some((fallback, primary))
}

fn scale(value: f64, len: usize) -> usize {
    ((value * len as f64).floor() as usize).min(len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemId, ItemInfo, SpritePos};

    fn catalog() -> ItemCatalog {
        ItemCatalog::new(
            ["a", "b", "x", "y", "z"]
                .iter()
                .enumerate()
                .map(|(i, name)| ItemInfo::new(*name, ItemId(i as u8 + 1), SpritePos::default())),
        )
    }

    fn item(name: &str) -> ItemRef {
        ItemRef::Item(name.to_string())
    }

    #[test]
    fn ordered_rule_cycles() {
        let rule = Rule::Ordered(vec![item("x"), item("y"), item("z")]);
        let catalog = catalog();
        let mut streams = Streams::new("12345", "ORtest");
        let mut picked = Vec::new();
        for slot in 1..=4 {
            let (name, next) = select(&rule, slot, &catalog, streams);
            picked.push(name);
            streams = next;
        }
        assert_eq!(picked, ["x", "y", "z", "x"]);
    }

    #[test]
    fn weighted_draws_follow_weights() {
        let weights = vec![(item("a"), 1.0), (item("b"), 3.0)];
        let mut primary = Alea::from_seed("weights");
        let (mut a, mut b) = (0u32, 0u32);
        for _ in 0..40_000 {
            let (picked, next) = pick_weighted(&weights, primary).unwrap();
            primary = next;
            match picked.name() {
                "a" => a += 1,
                "b" => b += 1,
                other => panic!("unexpected item {other}"),
            }
        }
        let ratio = f64::from(b) / f64::from(a);
        assert!((2.8..3.2).contains(&ratio), "ratio was {ratio}");
    }

    #[test]
    fn zero_weight_entries_are_never_picked() {
        let weights = vec![(item("a"), 0.0), (item("b"), 2.0), (item("x"), 0.0)];
        let mut primary = Alea::from_seed("zero");
        for _ in 0..1_000 {
            let (picked, next) = pick_weighted(&weights, primary).unwrap();
            assert_eq!(picked.name(), "b");
            primary = next;
        }
    }

    #[test]
    fn every_pool_draw_advances_both_streams_once() {
        let catalog = catalog();
        let start = Streams::new("1", "2");
        let category = ItemRef::Category {
            name: "letters".into(),
            members: vec!["a".into(), "b".into()],
        };

        for pool in [vec![item("a")], vec![category], vec![ItemRef::Wildcard]] {
            let (_, after) = draw_from_pool(&pool, &catalog, start);
            assert_eq!(after.primary, start.primary.next().1);
            assert_eq!(after.round, start.round.next().1);
        }
    }

    #[test]
    fn category_draw_stays_within_members() {
        let catalog = catalog();
        let pool = vec![ItemRef::Category {
            name: "letters".into(),
            members: vec!["x".into(), "y".into()],
        }];
        let mut streams = Streams::new("cat", "round");
        for _ in 0..500 {
            let (name, next) = draw_from_pool(&pool, &catalog, streams);
            assert!(name == "x" || name == "y");
            streams = next;
        }
    }

    #[test]
    fn empty_rules_draw_from_the_whole_catalog() {
        let catalog = catalog();
        let streams = Streams::new("empty", "ORtest");
        let (expected, expected_streams) = draw_from_pool(&[ItemRef::Wildcard], &catalog, streams);

        for rule in [
            Rule::Pool(Vec::new()),
            Rule::Ordered(Vec::new()),
            Rule::Weighted(Vec::new()),
        ] {
            let (name, after) = select(&rule, 3, &catalog, streams);
            assert_eq!(name, expected);
            assert_eq!(after, expected_streams);
        }
    }

    #[test]
    fn empty_category_expands_like_the_wildcard() {
        let catalog = catalog();
        let streams = Streams::new("hollow", "ORtest");
        let empty = vec![ItemRef::Category {
            name: "hollow".into(),
            members: Vec::new(),
        }];

        let (name, _) = draw_from_pool(&empty, &catalog, streams);
        let (expected, _) = draw_from_pool(&[ItemRef::Wildcard], &catalog, streams);
        assert_eq!(name, expected);
        assert!(pick_weighted(&[], streams.primary).is_none());
    }
}
