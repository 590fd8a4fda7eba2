//! Condvar park/wake bridge with a deadline.
//!
//! A [`Waiter`] is the pending half of a blocking call: it subscribes a
//! one-shot listener for the target event, the caller performs its
//! triggering action, then parks on [`wait`](Waiter::wait) until the event
//! fires or the deadline elapses. The slot resolves exactly once — by event
//! delivery or by deadline expiry, whichever happens first — and the loser
//! of that race is a no-op. The return value distinguishes "event observed"
//! from "timed out with no event" deterministically.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::protocol::{Event, EventKind};
use crate::sync::bus::EventBus;

// ============================================================================
// Waiter
// ============================================================================

/// State shared between the waiting thread and the delivering thread.
#[derive(Debug, Default)]
struct Slot {
    resolved: bool,
    event: Option<Event>,
}

/// One pending blocking call.
///
/// Created with [`subscribe`](Waiter::subscribe) *before* the triggering
/// action is performed, so an event that fires before the wait begins is
/// captured and the wait returns immediately.
#[derive(Debug, Default)]
pub struct Waiter {
    slot: Mutex<Slot>,
    cond: Condvar,
}

impl Waiter {
    /// Registers a one-shot listener for `kind` and returns the waiter that
    /// its delivery will wake.
    #[must_use]
    pub fn subscribe(bus: &EventBus, kind: EventKind) -> Arc<Self> {
        let waiter = Arc::new(Self::default());
        let delivery = Arc::clone(&waiter);
        bus.once(kind, move |event| delivery.complete(event.clone()));
        waiter
    }

    /// Resolves the slot with `event` and wakes the waiting thread.
    ///
    /// A no-op if the slot is already resolved — either a previous delivery
    /// won, or the deadline did.
    pub fn complete(&self, event: Event) {
        let mut slot = self.slot.lock();
        if slot.resolved {
            trace!("late event delivery ignored");
            return;
        }
        slot.resolved = true;
        slot.event = Some(event);
        self.cond.notify_one();
    }

    /// Parks the calling thread until the slot resolves or `timeout` passes.
    ///
    /// Returns the delivered event, or `None` on timeout. A timeout resolves
    /// the slot, so a late delivery after this returns is a no-op.
    #[must_use]
    pub fn wait(&self, timeout: Duration) -> Option<Event> {
        self.wait_until(Instant::now() + timeout)
    }

    /// Like [`wait`](Self::wait), bounded by an absolute deadline.
    #[must_use]
    pub fn wait_until(&self, deadline: Instant) -> Option<Event> {
        let mut slot = self.slot.lock();
        while !slot.resolved {
            if self.cond.wait_until(&mut slot, deadline).timed_out() {
                break;
            }
        }
        if slot.resolved {
            slot.event.take()
        } else {
            slot.resolved = true;
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
