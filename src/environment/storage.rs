//! Shared key/value storage with cross-window change notifications.
//!
//! Models the origin-scoped `localStorage` area: a single mutable cell per
//! key, last write wins, no locking across windows beyond the write itself.
//! Every change is broadcast as a [`StorageEvent`]; windows ignore events
//! they wrote themselves.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::WindowId;

// ============================================================================
// Constants
// ============================================================================

/// Capacity of the change notification channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// StorageEvent
// ============================================================================

/// A change notification for one storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Changed key.
    pub key: String,
    /// Value before the change.
    pub old_value: Option<String>,
    /// Value after the change (`None` on removal).
    pub new_value: Option<String>,
    /// Window that performed the write.
    pub writer: WindowId,
}

impl StorageEvent {
    /// Returns `true` if `window` should observe this event.
    ///
    /// Storage events never fire in the window that made the change.
    #[inline]
    #[must_use]
    pub fn is_visible_to(&self, window: WindowId) -> bool {
        self.writer != window
    }
}

// ============================================================================
// SharedStorage
// ============================================================================

/// Storage area shared by every window of one origin.
///
/// Cloning is cheap; clones refer to the same area.
#[derive(Clone)]
pub struct SharedStorage {
    inner: Arc<StorageInner>,
}

struct StorageInner {
    /// Stored items.
    items: RwLock<FxHashMap<String, String>>,
    /// Maximum total bytes of keys and values, if limited.
    quota_bytes: Option<usize>,
    /// Change notifications.
    events: broadcast::Sender<StorageEvent>,
}

impl fmt::Debug for SharedStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStorage")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for SharedStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedStorage {
    /// Creates an unlimited storage area.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a storage area that rejects writes beyond `quota_bytes`.
    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self::build(Some(quota_bytes))
    }

    fn build(quota_bytes: Option<usize>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(StorageInner {
                items: RwLock::new(FxHashMap::default()),
                quota_bytes,
                events,
            }),
        }
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get_item(&self, key: &str) -> Option<String> {
        self.inner.items.read().get(key).cloned()
    }

    /// Stores `value` under `key` on behalf of `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the write would exceed the quota.
    pub fn set_item(&self, writer: WindowId, key: &str, value: &str) -> Result<()> {
        let old_value = {
            let mut items = self.inner.items.write();

            if let Some(quota) = self.inner.quota_bytes {
                let current: usize = items
                    .iter()
                    .filter(|(k, _)| k.as_str() != key)
                    .map(|(k, v)| k.len() + v.len())
                    .sum();
                let required = current + key.len() + value.len();
                if required > quota {
                    debug!(key, required, quota, "Storage quota exceeded");
                    return Err(Error::storage(format!(
                        "quota exceeded: {required}/{quota} bytes"
                    )));
                }
            }

            items.insert(key.to_string(), value.to_string())
        };

        trace!(key, %writer, "Storage item set");
        self.notify(StorageEvent {
            key: key.to_string(),
            old_value,
            new_value: Some(value.to_string()),
            writer,
        });
        Ok(())
    }

    /// Removes `key` on behalf of `writer`. No event fires if it was absent.
    pub fn remove_item(&self, writer: WindowId, key: &str) {
        let old_value = self.inner.items.write().remove(key);
        if old_value.is_some() {
            self.notify(StorageEvent {
                key: key.to_string(),
                old_value,
                new_value: None,
                writer,
            });
        }
    }

    /// Number of stored items.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.read().is_empty()
    }

    /// Subscribes to change notifications from all writers.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.events.subscribe()
    }

    fn notify(&self, event: StorageEvent) {
        // No subscribers is fine: nobody is listening yet.
        let _ = self.inner.events.send(event);
    }
}

// ============================================================================
// Tests
// ============================================================================
