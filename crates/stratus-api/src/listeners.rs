//! Connection-event listener registry.
//!
//! Connection-level failures are global: they are never surfaced through
//! per-call rejections, they are broadcast to every callback registered
//! for the matching event name. The registry is an explicit object owned
//! by the client (and shared with the socket task), not a set of
//! implicitly-bound methods.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The two connection-lifecycle events observers can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionEvent {
    SocketError,
    SocketClose,
}

/// Payload delivered to connection-event listeners.
#[derive(Debug, Clone)]
pub struct ConnectionNotice {
    pub event: ConnectionEvent,
    pub detail: String,
}

/// A registered callback. `Arc` identity doubles as the removal key.
pub type ConnectionListener = Arc<dyn Fn(&ConnectionNotice) + Send + Sync>;

/// Registry of connection-event callbacks, keyed by event.
///
/// Callbacks fire in registration order. Removal filters by `Arc`
/// identity and preserves the order of the remaining callbacks.
#[derive(Default)]
pub struct Listeners {
    inner: Mutex<HashMap<ConnectionEvent, Vec<ConnectionListener>>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback for `event`.
    pub fn add(&self, event: ConnectionEvent, listener: ConnectionListener) {
        let mut inner = self.inner.lock().expect("listener lock poisoned");
        inner.entry(event).or_default().push(listener);
    }

    /// Remove a previously added callback, identified by `Arc` pointer.
    pub fn remove(&self, event: ConnectionEvent, listener: &ConnectionListener) {
        let mut inner = self.inner.lock().expect("listener lock poisoned");
        if let Some(callbacks) = inner.get_mut(&event) {
            callbacks.retain(|cb| !Arc::ptr_eq(cb, listener));
        }
    }

    /// Invoke every callback registered for the notice's event, in
    /// registration order. Callbacks run outside the lock.
    pub(crate) fn emit(&self, notice: &ConnectionNotice) {
        let callbacks: Vec<ConnectionListener> = {
            let inner = self.inner.lock().expect("listener lock poisoned");
            inner.get(&notice.event).cloned().unwrap_or_default()
        };
        for callback in callbacks {
            callback(notice);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().expect("listener lock poisoned");
        let counts: HashMap<_, _> = inner.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("Listeners").field("registered", &counts).finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
