//! Cycle-indexed event scheduler.
//!
//! Delivers a callback at or after a target cycle, driven solely by the
//! monotonically increasing cycle counter the CPU advances. The host
//! calls [`Scheduler::run_due`] between instructions; due events fire
//! inline, synchronously, exactly once. No threads, no blocking.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::{Cycles, DeviceId, EventKind};

/// Callback fired when an event comes due.
///
/// The callback receives the scheduler so it can queue a follow-up event
/// (key-repeat pacing, periodic timers). It must not re-enter `run_due`
/// or drive the CPU; that is a contract violation, not a supported path.
pub type EventCallback = Box<dyn FnOnce(&mut Scheduler)>;

/// A deferred callback keyed by the cycle at which it fires.
pub struct ScheduledEvent {
    fire_cycle: Cycles,
    seq: u64,
    kind: EventKind,
    device: DeviceId,
    callback: EventCallback,
}

impl ScheduledEvent {
    /// Cycle at which the event becomes due.
    #[must_use]
    pub fn fire_cycle(&self) -> Cycles {
        self.fire_cycle
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Device that owns this event.
    #[must_use]
    pub fn device(&self) -> DeviceId {
        self.device
    }
}

// BinaryHeap is a max-heap; ordering is reversed on (fire_cycle, seq) so
// the earliest event, and among ties the first scheduled, pops first.
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_cycle
            .cmp(&self.fire_cycle)
            .then(other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.fire_cycle == other.fire_cycle && self.seq == other.seq
    }
}

impl Eq for ScheduledEvent {}

/// Min-heap of deferred callbacks, FIFO-stable among equal fire cycles.
#[derive(Default)]
pub struct Scheduler {
    queue: BinaryHeap<ScheduledEvent>,
    seq: u64,
    dispatching: bool,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `callback` to fire once the cycle counter reaches
    /// `fire_cycle`.
    pub fn schedule_at(
        &mut self,
        fire_cycle: Cycles,
        kind: EventKind,
        device: DeviceId,
        callback: EventCallback,
    ) {
        let seq = self.seq;
        self.seq += 1;
        self.queue.push(ScheduledEvent {
            fire_cycle,
            seq,
            kind,
            device,
            callback,
        });
    }

    /// Fire every event whose fire cycle is at or before `now`.
    ///
    /// Events fire in (fire cycle, insertion) order and are consumed
    /// exactly once. An event scheduled by a callback with a fire cycle
    /// at or before `now` fires in the same pass.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly from a firing callback.
    pub fn run_due(&mut self, now: Cycles) {
        assert!(
            !self.dispatching,
            "scheduler dispatch re-entered from a callback"
        );
        self.dispatching = true;
        loop {
            let due = self
                .queue
                .peek()
                .is_some_and(|event| event.fire_cycle <= now);
            if !due {
                break;
            }
            if let Some(event) = self.queue.pop() {
                (event.callback)(self);
            }
        }
        self.dispatching = false;
    }

    /// Drop every pending event owned by `device`.
    ///
    /// Devices call this from their own reset so stale callbacks never
    /// fire against reinitialised state.
    pub fn clear_device(&mut self, device: DeviceId) {
        self.queue.retain(|event| event.device != device);
    }

    /// Number of pending events.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Fire cycle of the next due event, if any.
    #[must_use]
    pub fn next_fire(&self) -> Option<Cycles> {
        self.queue.peek().map(ScheduledEvent::fire_cycle)
    }
}
