//! Listener registry shared by a bridge and its event loop.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;

use crate::protocol::RawMessage;

// ============================================================================
// Types
// ============================================================================

/// Inbound listener callback.
///
/// Called once per raw inbound value. Registering the same `Arc` twice calls
/// it twice; removal matches by pointer identity.
pub type Listener = Arc<dyn Fn(RawMessage) + Send + Sync>;

// ============================================================================
// ListenerSet
// ============================================================================

/// Ordered set of listeners.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Clone, Default)]
pub(crate) struct ListenerSet {
    inner: Arc<Mutex<Vec<Listener>>>,
}

impl ListenerSet {
    pub(crate) fn add(&self, listener: Listener) {
        self.inner.lock().push(listener);
    }

    /// Removes the first registration of `listener`.
    pub(crate) fn remove(&self, listener: &Listener) -> bool {
        let mut listeners = self.inner.lock();
        match listeners.iter().position(|l| Arc::ptr_eq(l, listener)) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Calls every listener with a copy of `raw`.
    ///
    /// Listeners run outside the lock, so they may add or remove listeners.
    pub(crate) fn dispatch(&self, raw: &RawMessage) {
        let snapshot: Vec<Listener> = self.inner.lock().clone();
        for listener in snapshot {
            listener(raw.clone());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
