//! One-line console rendering of runtime events.

use rip_core::WriteFlag;
use runtime::{DeliveryEvent, DeviceEvent, Event, ScheduleEvent};

/// Renders `event` for the console, or `None` for events too frequent to
/// print (snapshots, phase changes, passes that queued nothing).
pub fn describe(event: &Event) -> Option<String> {
    match event {
        Event::Device(event) => describe_device(event),
        Event::Schedule(event) => describe_schedule(event),
        Event::Delivery(event) => describe_delivery(event),
    }
}

fn describe_device(event: &DeviceEvent) -> Option<String> {
    match event {
        DeviceEvent::Discovered { devices } => Some(format!("{} device(s) found", devices.len())),
        DeviceEvent::Selected { uri } => Some(format!("Using device {uri}")),
        DeviceEvent::Lost { uri } => Some(format!("Lost device {uri}")),
        DeviceEvent::ReadFailed { reason } => Some(format!("Device read failed: {reason}")),
        DeviceEvent::Incompatible { rom } => {
            Some(format!("ROM {rom} does not support deliveries"))
        }
        DeviceEvent::Snapshot(_) => None,
    }
}

fn describe_schedule(event: &ScheduleEvent) -> Option<String> {
    match event {
        ScheduleEvent::RunStarted { rom, seed, config } => {
            Some(format!("Run started on {rom} (seed {seed}, config {config})"))
        }
        ScheduleEvent::RunRehydrated { rom, seed, config } => {
            Some(format!("Run resumed on {rom} (seed {seed}, config {config})"))
        }
        ScheduleEvent::RunReset { rom } => Some(format!("Run on {rom} reset")),
        ScheduleEvent::AwaitingStart { rom } => Some(format!("ROM {rom} has no run yet")),
        ScheduleEvent::Updated {
            enqueued, queued, ..
        } if !enqueued.is_empty() => {
            let items: Vec<String> = enqueued
                .iter()
                .map(|entry| format!("{} {}", entry.item, entry.index))
                .collect();
            Some(format!("Queued {} ({queued} waiting)", items.join(", ")))
        }
        ScheduleEvent::Updated { .. } => None,
    }
}

fn describe_delivery(event: &DeliveryEvent) -> Option<String> {
    match event {
        DeliveryEvent::Delivered { entry, flag } => {
            let suffix = match flag {
                WriteFlag::QueueDrain => "",
                WriteFlag::SingleSend => " (single send)",
            };
            Some(format!("Delivered {} {}{suffix}", entry.item, entry.index))
        }
        DeliveryEvent::Dropped { entry, expected } => Some(format!(
            "Dropped {} {}: device expects {expected}",
            entry.item, entry.index
        )),
        DeliveryEvent::DrainFinished { delivered, dropped } if delivered + dropped > 0 => Some(
            format!("Drain finished: {delivered} delivered, {dropped} dropped"),
        ),
        DeliveryEvent::DrainFailed { reason } => Some(format!("Drain failed: {reason}")),
        DeliveryEvent::Phase(_)
        | DeliveryEvent::DrainStarted { .. }
        | DeliveryEvent::DrainFinished { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use rip_core::{EventIndex, ItemHistory, QueueEntry, RomIdentity};
    use runtime::DeliveryPhase;

    use super::*;

    #[test]
    fn deliveries_name_item_and_index() {
        let event = Event::Delivery(DeliveryEvent::Delivered {
            entry: QueueEntry::new("bow", EventIndex(3)),
            flag: WriteFlag::SingleSend,
        });
        assert_eq!(
            describe(&event).as_deref(),
            Some("Delivered bow #3 (single send)")
        );

        let event = Event::Delivery(DeliveryEvent::Dropped {
            entry: QueueEntry::new("bow", EventIndex(5)),
            expected: EventIndex(4),
        });
        assert_eq!(
            describe(&event).as_deref(),
            Some("Dropped bow #5: device expects #4")
        );
    }

    #[test]
    fn quiet_events_are_skipped() {
        let quiet = [
            Event::Delivery(DeliveryEvent::Phase(DeliveryPhase::WaitAck)),
            Event::Schedule(ScheduleEvent::Updated {
                history: ItemHistory::new(),
                enqueued: Vec::new(),
                queued: 0,
            }),
            Event::Delivery(DeliveryEvent::DrainFinished {
                delivered: 0,
                dropped: 0,
            }),
        ];
        assert!(quiet.iter().all(|event| describe(event).is_none()));
    }

    #[test]
    fn queued_entries_are_listed() {
        let event = Event::Schedule(ScheduleEvent::Updated {
            history: ItemHistory::new(),
            enqueued: vec![
                QueueEntry::new("bow", EventIndex(1)),
                QueueEntry::new("hookshot", EventIndex(2)),
            ],
            queued: 2,
        });
        assert_eq!(
            describe(&event).as_deref(),
            Some("Queued bow #1, hookshot #2 (2 waiting)")
        );

        let event = Event::Device(DeviceEvent::Incompatible {
            rom: RomIdentity::new("ZELDA3"),
        });
        assert_eq!(
            describe(&event).as_deref(),
            Some("ROM ZELDA3 does not support deliveries")
        );
    }
}
