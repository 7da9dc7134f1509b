//! Per-ROM run session.
//!
//! A [`RunSession`] holds the immutable run metadata (seed, schedule) and the
//! mutable delivery state: the queue of due-but-undelivered entries and the
//! item history. It also owns the single-flight token that keeps at most one
//! drain running at a time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use rip_core::{
    DeviceSnapshot, EventIndex, ItemCatalog, ItemHistory, QueueEntry, RomIdentity, RunRecord,
    Schedule, SchedulePass, ScheduleRequest, compute,
};

use crate::delivery::DeliveryError;

/// Proof that the holder is the only drain running for a session.
///
/// Dropping the permit releases the token, on success and on error alike.
#[derive(Debug)]
pub struct DrainPermit {
    token: Arc<AtomicBool>,
}

impl Drop for DrainPermit {
    fn drop(&mut self) {
        self.token.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
struct SessionState {
    queue: VecDeque<QueueEntry>,
    history: ItemHistory,
}

/// Outcome of applying a scheduling pass to the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutcome {
    /// Entries newly appended to the queue.
    pub enqueued: Vec<QueueEntry>,
    /// Whether enqueuing was skipped because a drain was running.
    pub gated: bool,
}

/// Read-only copy of a session for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub rom: RomIdentity,
    pub record: RunRecord,
    pub queue: Vec<QueueEntry>,
    pub history: ItemHistory,
    pub draining: bool,
}

/// State of the run on one ROM.
#[derive(Debug)]
pub struct RunSession {
    rom: RomIdentity,
    record: RunRecord,
    schedule: Arc<Schedule>,
    draining: Arc<AtomicBool>,
    state: Mutex<SessionState>,
}

impl RunSession {
    /// Creates a session with an empty queue and history.
    pub fn new(rom: RomIdentity, record: RunRecord, schedule: Schedule) -> Self {
        Self {
            rom,
            record,
            schedule: Arc::new(schedule),
            draining: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(SessionState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn rom(&self) -> &RomIdentity {
        &self.rom
    }

    pub fn record(&self) -> &RunRecord {
        &self.record
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Takes the single-flight token, or fails with [`DeliveryError::Busy`].
    pub fn try_begin_drain(&self) -> Result<DrainPermit, DeliveryError> {
        self.draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| DrainPermit {
                token: Arc::clone(&self.draining),
            })
            .map_err(|_| DeliveryError::Busy)
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Runs one scheduling pass for `snapshot` without touching the session.
    pub fn compute_pass(&self, snapshot: &DeviceSnapshot, catalog: &ItemCatalog) -> SchedulePass {
        let seed = self.record.seed.to_string();
        let live_queue = self.queue();
        compute(ScheduleRequest {
            seed: &seed,
            round_seed: self.rom.as_str(),
            schedule: &self.schedule,
            catalog,
            prev_acked: snapshot.ack.index,
            elapsed_minutes: snapshot.elapsed_minutes(),
            live_queue: &live_queue,
        })
    }

    /// Replaces the history with `pass.due` and appends new entries to the
    /// queue, unless a drain is running.
    pub fn apply_pass(&self, pass: SchedulePass) -> PassOutcome {
        let mut state = self.state();
        state.history = pass.due;

        if self.is_draining() {
            return PassOutcome {
                enqueued: Vec::new(),
                gated: true,
            };
        }

        let mut enqueued = Vec::new();
        for entry in pass.to_send {
            if !state.queue.contains(&entry) {
                state.queue.push_back(entry.clone());
                enqueued.push(entry);
            }
        }
        PassOutcome {
            enqueued,
            gated: false,
        }
    }

    /// Removes and returns the head of the queue.
    pub fn pop_front(&self) -> Option<QueueEntry> {
        self.state().queue.pop_front()
    }

    pub fn enqueue(&self, entry: QueueEntry) {
        let mut state = self.state();
        if !state.queue.contains(&entry) {
            state.queue.push_back(entry);
        }
    }

    pub fn queue(&self) -> Vec<QueueEntry> {
        self.state().queue.iter().cloned().collect()
    }

    pub fn queue_len(&self) -> usize {
        self.state().queue.len()
    }

    /// Records an entry the device accepted.
    pub fn record_delivered(&self, entry: QueueEntry) {
        self.state().history.record(entry);
    }

    pub fn history(&self) -> ItemHistory {
        self.state().history.clone()
    }

    pub fn contains_index(&self, index: EventIndex) -> bool {
        self.state().history.contains_index(index)
    }

    /// Clears the queue and history.
    pub fn clear(&self) {
        let mut state = self.state();
        state.queue.clear();
        state.history.clear();
    }

    pub fn view(&self) -> SessionView {
        let state = self.state();
        SessionView {
            rom: self.rom.clone(),
            record: self.record.clone(),
            queue: state.queue.iter().cloned().collect(),
            history: state.history.clone(),
            draining: self.is_draining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rip_core::{Interval, ItemId, ItemInfo, ItemRef, Rule, RunSeed, SpritePos};

    use super::*;

    fn session() -> RunSession {
        let schedule = Schedule::new(vec![Interval::new(
            0.0,
            1.0,
            Rule::Pool(vec![ItemRef::Item("bow".into())]),
        )]);
        RunSession::new(
            RomIdentity::new("ORtest"),
            RunRecord::new(RunSeed::Random(12345), "default"),
            schedule,
        )
    }

    fn catalog() -> ItemCatalog {
        ItemCatalog::new([ItemInfo::new("bow", ItemId(0x0B), SpritePos::default())])
    }

    fn snapshot(minutes: u32, acked: u16) -> DeviceSnapshot {
        let mut snapshot = DeviceSnapshot {
            game_mode: 0x07,
            elapsed_frames: (f64::from(minutes * 60) * rip_core::time::GAME_FPS) as u32 + 1,
            ..Default::default()
        };
        snapshot.ack.index = EventIndex(acked);
        snapshot
    }

    #[test]
    fn single_flight_token() {
        let session = session();
        let permit = session.try_begin_drain().unwrap();
        assert!(session.is_draining());
        assert!(matches!(session.try_begin_drain(), Err(DeliveryError::Busy)));

        drop(permit);
        assert!(!session.is_draining());
        assert!(session.try_begin_drain().is_ok());
    }

    #[test]
    fn pass_enqueues_only_new_entries() {
        let session = session();
        let catalog = catalog();

        let pass = session.compute_pass(&snapshot(4, 0), &catalog);
        let outcome = session.apply_pass(pass);
        assert_eq!(outcome.enqueued.len(), 3);

        let pass = session.compute_pass(&snapshot(5, 0), &catalog);
        let outcome = session.apply_pass(pass);
        assert_eq!(outcome.enqueued, [QueueEntry::new("bow", EventIndex(4))]);
        assert_eq!(session.queue_len(), 4);
        assert_eq!(session.history().indices(), [1, 2, 3, 4]);
    }

    #[test]
    fn enqueue_is_gated_while_draining() {
        let session = session();
        let _permit = session.try_begin_drain().unwrap();

        let pass = session.compute_pass(&snapshot(4, 0), &catalog());
        let outcome = session.apply_pass(pass);
        assert!(outcome.gated);
        assert_eq!(session.queue_len(), 0);
        // History is replaced regardless.
        assert_eq!(session.history().len(), 3);
    }

    #[test]
    fn clear_drops_queue_and_history() {
        let session = session();
        let pass = session.compute_pass(&snapshot(4, 0), &catalog());
        session.apply_pass(pass);
        session.clear();

        let view = session.view();
        assert!(view.queue.is_empty());
        assert!(view.history.is_empty());
    }
}
