//! Android `WebView` bridge.
//!
//! Sends through the `Android.postMessage` JavaScript interface. Receives
//! same-window messages tagged `native` or `android`.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::environment::Window;
use crate::error::Result;

use super::listeners::Listener;
use super::native::{NativeChannel, NativeHost};

// ============================================================================
// AndroidBridge
// ============================================================================

/// Transport to an Android host.
pub struct AndroidBridge {
    channel: NativeChannel,
}

impl fmt::Debug for AndroidBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AndroidBridge")
            .field("listeners", &self.channel.listener_count())
            .finish_non_exhaustive()
    }
}

impl AndroidBridge {
    /// Creates the bridge and starts its inbound event loop.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self {
            channel: NativeChannel::new(NativeHost::Android, window),
        }
    }

    /// Posts `serialized` to the Android interface.
    ///
    /// # Errors
    ///
    /// Same as [`IosBridge::send`](super::IosBridge::send).
    pub async fn send(&self, serialized: &str) -> Result<()> {
        self.channel.send(serialized).await
    }

    /// Registers an inbound listener.
    pub fn add_listener(&self, listener: Listener) {
        self.channel.add_listener(listener);
    }

    /// Unregisters a listener.
    pub fn remove_listener(&self, listener: &Listener) -> bool {
        self.channel.remove_listener(listener)
    }

    #[inline]
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.channel.listener_count()
    }

    /// Stops the inbound event loop.
    pub fn shutdown(&self) {
        self.channel.shutdown();
    }
}

// ============================================================================
// Tests
// ============================================================================
