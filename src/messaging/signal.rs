// Observer signals - connect/emit callback lists

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one connection to a [`Signal`], returned by `connect()`.
///
/// Pass it back to `disconnect()` to remove the slot. Dropping the id does
/// not disconnect; connections live as long as the signal unless removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

type Slot<T> = Box<dyn Fn(&T) + Send>;

/// A list of observer callbacks invoked in connection order.
///
/// Signals are the notification seam between the core and its collaborators
/// (GUI menus, provenance recorders). Observers run on whichever thread
/// emits, which for action signals is always the application thread.
///
/// Callbacks must not connect or disconnect slots on the same signal they
/// are invoked from; the slot list is locked for the duration of `emit()`.
pub struct Signal<T> {
    slots: Mutex<Vec<(ConnectionId, Slot<T>)>>,
    next_id: AtomicU64,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register an observer. Returns an id that can be used to disconnect.
    pub fn connect(&self, slot: impl Fn(&T) + Send + 'static) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.slots
            .lock()
            .expect("signal slot list poisoned")
            .push((id, Box::new(slot)));
        id
    }

    /// Remove a previously connected observer. Unknown ids are ignored.
    pub fn disconnect(&self, id: ConnectionId) {
        self.slots
            .lock()
            .expect("signal slot list poisoned")
            .retain(|(slot_id, _)| *slot_id != id);
    }

    /// Invoke every connected observer with `value`.
    pub fn emit(&self, value: &T) {
        let slots = self.slots.lock().expect("signal slot list poisoned");
        for (_, slot) in slots.iter() {
            slot(value);
        }
    }

    pub fn num_connections(&self) -> usize {
        self.slots.lock().expect("signal slot list poisoned").len()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}
