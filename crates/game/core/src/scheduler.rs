//! Deterministic item scheduler.
//!
//! Given the run seed, the round seed derived from the ROM identity, a
//! schedule, the device's acknowledged position and the elapsed play time,
//! [`compute`] replays the schedule from the beginning and reports every
//! slot that is already due together with the ones the device has not yet
//! acknowledged.
//!
//! The pass is pure apart from `live_queue`: entries already waiting in the
//! delivery queue are not handed out a second time.

use crate::catalog::ItemCatalog;
use crate::queue::{EventIndex, ItemHistory, QueueEntry};
use crate::schedule::{END_SENTINEL, Schedule};
use crate::selection::{Streams, select};
use crate::time::round2;

/// Inputs of one scheduling pass.
#[derive(Clone, Copy, Debug)]
pub struct ScheduleRequest<'a> {
    /// Seed of the primary stream (final item selection).
    pub seed: &'a str,
    /// Seed of the round stream (pool candidate selection).
    pub round_seed: &'a str,
    pub schedule: &'a Schedule,
    pub catalog: &'a ItemCatalog,
    /// Last event index the device has acknowledged.
    pub prev_acked: EventIndex,
    /// Elapsed in-game minutes.
    pub elapsed_minutes: f64,
    /// Entries currently waiting in the delivery queue.
    pub live_queue: &'a [QueueEntry],
}

/// Result of a scheduling pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchedulePass {
    /// Every slot due so far, unique by event index.
    pub due: ItemHistory,
    /// Due slots past `prev_acked` that are not already queued.
    pub to_send: Vec<QueueEntry>,
}

/// Runs one scheduling pass.
pub fn compute(request: ScheduleRequest<'_>) -> SchedulePass {
    let minutes = round2(request.elapsed_minutes);
    let mut streams = Streams::new(request.seed, request.round_seed);
    let mut pass = SchedulePass::default();

    let mut global: u32 = 0;
    let mut cumulative = 0.0;

    'intervals: for interval in request.schedule.normalized() {
        let end = interval.end.unwrap_or(END_SENTINEL);
        let length = round2(end - interval.start);
        let slots = (length / interval.frequency).round().max(0.0) as u32;

        for slot_in_interval in 1..=slots {
            global += 1;
            cumulative = round2(cumulative + interval.frequency);
            if cumulative >= minutes {
                break 'intervals;
            }
            let Ok(index) = u16::try_from(global) else {
                break 'intervals;
            };

            let (item, next) = select(&interval.rule, slot_in_interval, request.catalog, streams);
            streams = next;

            let entry = QueueEntry::new(item, EventIndex(index));
            if !request.live_queue.contains(&entry) && entry.index > request.prev_acked {
                pass.to_send.push(entry.clone());
            }
            pass.due.record(entry);
        }
    }

    pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemId, ItemInfo, SpritePos};
    use crate::item_ref::ItemRef;
    use crate::schedule::{Interval, Rule};

    fn catalog() -> ItemCatalog {
        ItemCatalog::new(
            ["itemA", "itemB", "itemC", "itemD"]
                .iter()
                .enumerate()
                .map(|(i, name)| ItemInfo::new(*name, ItemId(i as u8 + 1), SpritePos::default())),
        )
    }

    fn single_item_schedule() -> Schedule {
        Schedule::new(vec![Interval::new(
            0.0,
            1.0,
            Rule::Pool(vec![ItemRef::Item("itemA".into())]),
        )])
    }

    fn request<'a>(
        schedule: &'a Schedule,
        catalog: &'a ItemCatalog,
        prev_acked: u16,
        elapsed_minutes: f64,
        live_queue: &'a [QueueEntry],
    ) -> ScheduleRequest<'a> {
        ScheduleRequest {
            seed: "12345",
            round_seed: "ORtestrom",
            schedule,
            catalog,
            prev_acked: EventIndex(prev_acked),
            elapsed_minutes,
            live_queue,
        }
    }

    #[test]
    fn single_item_schedule_from_zero() {
        let schedule = single_item_schedule();
        let catalog = catalog();
        let pass = compute(request(&schedule, &catalog, 0, 3.5, &[]));

        assert_eq!(pass.due.indices(), [1, 2, 3]);
        assert!(pass.due.entries().iter().all(|entry| entry.item == "itemA"));
        assert_eq!(
            pass.to_send.iter().map(|e| e.index.get()).collect::<Vec<_>>(),
            [1, 2, 3]
        );
    }

    #[test]
    fn acknowledged_entries_are_not_resent() {
        let schedule = single_item_schedule();
        let catalog = catalog();
        let pass = compute(request(&schedule, &catalog, 2, 3.5, &[]));

        assert_eq!(pass.due.indices(), [1, 2, 3]);
        assert_eq!(pass.to_send, [QueueEntry::new("itemA", EventIndex(3))]);
    }

    #[test]
    fn queued_entries_stay_in_history_but_are_not_resent() {
        let schedule = single_item_schedule();
        let catalog = catalog();
        let queued = [QueueEntry::new("itemA", EventIndex(2))];
        let pass = compute(request(&schedule, &catalog, 0, 3.5, &queued));

        assert_eq!(pass.due.indices(), [1, 2, 3]);
        assert_eq!(
            pass.to_send.iter().map(|e| e.index.get()).collect::<Vec<_>>(),
            [1, 3]
        );
    }

    #[test]
    fn slot_reaching_elapsed_time_is_not_due() {
        let schedule = single_item_schedule();
        let catalog = catalog();
        assert_eq!(compute(request(&schedule, &catalog, 0, 3.0, &[])).due.len(), 2);
        assert!(compute(request(&schedule, &catalog, 0, 0.0, &[])).due.is_empty());
    }

    #[test]
    fn indices_are_contiguous_across_intervals() {
        let schedule = Schedule::new(vec![
            Interval::new(5.0, 0.5, Rule::wildcard()),
            Interval::new(0.0, 1.0, Rule::Ordered(vec![
                ItemRef::Item("itemB".into()),
                ItemRef::Item("itemC".into()),
            ])),
        ]);
        let catalog = catalog();
        let pass = compute(request(&schedule, &catalog, 0, 12.0, &[]));

        let expected: Vec<u16> = (1..=pass.due.len() as u16).collect();
        assert_eq!(pass.due.indices(), expected);
        // 5 one-minute slots, then half-minute slots until the 12th minute.
        assert_eq!(pass.due.len(), 5 + 13);
        let first_five: Vec<_> = pass.due.entries()[..5].iter().map(|e| e.item.as_str()).collect();
        assert_eq!(first_five, ["itemB", "itemC", "itemB", "itemC", "itemB"]);
    }

    #[test]
    fn non_positive_frequency_terminates() {
        let schedule = Schedule::new(vec![
            Interval::new(0.0, 0.0, Rule::wildcard()),
            Interval::new(1.0, -3.0, Rule::wildcard()),
        ]);
        let catalog = catalog();
        let pass = compute(request(&schedule, &catalog, 0, 2.0, &[]));
        assert!(!pass.due.is_empty());
        assert!(pass.due.len() < 25);
    }

    #[test]
    fn passes_are_deterministic() {
        let schedule = Schedule::new(vec![
            Interval::new(0.0, 0.5, Rule::wildcard()),
            Interval::new(10.0, 1.0, Rule::Weighted(vec![
                (ItemRef::Item("itemA".into()), 1.0),
                (ItemRef::Wildcard, 2.0),
            ])),
        ]);
        let catalog = catalog();
        let queued = [QueueEntry::new("itemA", EventIndex(4))];

        let first = compute(request(&schedule, &catalog, 3, 30.0, &queued));
        let second = compute(request(&schedule, &catalog, 3, 30.0, &queued));
        assert_eq!(first, second);
    }

    #[test]
    fn live_queue_changes_only_to_send() {
        let schedule = Schedule::new(vec![Interval::new(0.0, 1.0, Rule::wildcard())]);
        let catalog = catalog();
        let baseline = compute(request(&schedule, &catalog, 0, 6.0, &[]));
        let queued = vec![baseline.to_send[0].clone()];
        let with_queue = compute(request(&schedule, &catalog, 0, 6.0, &queued));

        assert_eq!(baseline.due, with_queue.due);
        assert_eq!(with_queue.to_send.len(), baseline.to_send.len() - 1);
    }
}
