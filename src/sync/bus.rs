//! Thread-safe publish/subscribe registry.
//!
//! The bus owns the subscription list; any thread may register or remove
//! listeners, and `emit` invokes the listeners for an event's kind
//! synchronously on the emitting thread — for engine events that is the
//! reader thread. Listeners for the same kind fire in registration order.
//! No ordering holds across distinct kinds.
//!
//! One-shot listeners are unregistered under the same lock acquisition that
//! snapshots the dispatch list, so concurrent emits cannot fire them twice.
//! Callbacks run with no bus lock held and may freely re-enter the bus.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::protocol::{Event, EventKind};

// ============================================================================
// Types
// ============================================================================

/// Listener callback type.
type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

/// Map of event kinds to their registered listeners.
type ListenerMap = FxHashMap<EventKind, Vec<Listener>>;

/// Handle identifying a registered listener, for [`EventBus::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

/// A registered subscription.
struct Listener {
    id: ListenerId,
    once: bool,
    callback: Callback,
}

// ============================================================================
// EventBus
// ============================================================================

/// Thread-safe publish/subscribe registry for connection events.
///
/// Owned by the client; shared with the reader thread behind an `Arc`.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<ListenerMap>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Creates an empty bus.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a persistent listener for `kind`.
    pub fn on(&self, kind: EventKind, callback: impl Fn(&Event) + Send + Sync + 'static) -> ListenerId {
        self.register(kind, false, Arc::new(callback))
    }

    /// Registers a listener that auto-deregisters after its first invocation.
    pub fn once(
        &self,
        kind: EventKind,
        callback: impl Fn(&Event) + Send + Sync + 'static,
    ) -> ListenerId {
        self.register(kind, true, Arc::new(callback))
    }

    /// Removes a listener. Returns `false` if it was already gone.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(entries) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|listener| listener.id != id);
        entries.len() != before
    }

    /// Invokes all current listeners for the event's kind, in registration
    /// order, on the calling thread.
    pub fn emit(&self, event: &Event) {
        let kind = event.kind();
        let snapshot: Vec<Callback> = {
            let mut listeners = self.listeners.lock();
            let Some(entries) = listeners.get_mut(&kind) else {
                return;
            };
            let snapshot = entries
                .iter()
                .map(|listener| Arc::clone(&listener.callback))
                .collect();
            entries.retain(|listener| !listener.once);
            snapshot
        };

        trace!(?kind, count = snapshot.len(), "dispatching event");
        for callback in snapshot {
            callback(event);
        }
    }

    /// Number of listeners currently registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .lock()
            .get(&kind)
            .map_or(0, |entries| entries.len())
    }

    fn register(&self, kind: EventKind, once: bool, callback: Callback) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .entry(kind)
            .or_default()
            .push(Listener { id, once, callback });
        id
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
