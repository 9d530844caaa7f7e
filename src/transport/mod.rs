//! Message transports.
//!
//! One transport per hosting environment, all behind the closed [`Bridge`]
//! enum so the message service never cares which one it drives.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   send(serialized)   ┌─────────────────────────────┐
//! │  MessageService  │ ───────────────────► │ Bridge::Ios     → webkit    │
//! │                  │                      │ Bridge::Android → Android   │
//! │                  │ ◄─────────────────── │ Bridge::Browser → storage   │
//! └──────────────────┘   Listener(raw)      └─────────────────────────────┘
//! ```
//!
//! # Bridge Lifecycle
//!
//! 1. [`BridgeFactory::create_bridge`] picks the variant once
//! 2. The bridge spawns its inbound event loop
//! 3. Listeners receive every inbound [`RawMessage`](crate::protocol::RawMessage)
//! 4. [`Bridge::shutdown`] (or drop) stops the event loop
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `android` | `Android.postMessage` transport |
//! | `browser` | Cross-tab storage relay |
//! | `factory` | Bridge selection from the detector verdict |
//! | `ios` | `webkit.messageHandlers` transport |
//! | `listeners` | Listener registry |

// ============================================================================
// Submodules
// ============================================================================

/// Android host transport.
pub mod android;

/// Browser cross-tab transport.
pub mod browser;

/// Bridge selection.
pub mod factory;

/// iOS host transport.
pub mod ios;

/// Listener registry.
pub mod listeners;

mod native;

// ============================================================================
// Re-exports
// ============================================================================

pub use android::AndroidBridge;
pub use browser::{BrowserBridge, STORAGE_KEY};
pub use factory::BridgeFactory;
pub use ios::IosBridge;
pub use listeners::Listener;

// ============================================================================
// Imports
// ============================================================================

use crate::error::Result;
use crate::platform::Platform;

// ============================================================================
// LoopCommand
// ============================================================================

/// Internal commands for a bridge event loop.
pub(crate) enum LoopCommand {
    /// Stop the event loop.
    Shutdown,
}

// ============================================================================
// Bridge
// ============================================================================

/// A transport selected for the current hosting environment.
#[derive(Debug)]
pub enum Bridge {
    /// iOS `WKWebView` host.
    Ios(IosBridge),
    /// Android `WebView` host.
    Android(AndroidBridge),
    /// Plain browser, cross-tab relay.
    Browser(BrowserBridge),
}

impl Bridge {
    /// Delivers one serialized message to the counterpart.
    ///
    /// Resolves once the underlying mechanism accepted the message. Never
    /// drops silently: an unusable mechanism yields an error.
    ///
    /// # Errors
    ///
    /// - [`Error::TransportUnavailable`](crate::Error::TransportUnavailable) if a native entry point is missing
    /// - [`Error::NativeCall`](crate::Error::NativeCall) if the host reports a failure
    /// - [`Error::Storage`](crate::Error::Storage) if the cross-tab slot rejects the write
    pub async fn send(&self, serialized: &str) -> Result<()> {
        match self {
            Self::Ios(bridge) => bridge.send(serialized).await,
            Self::Android(bridge) => bridge.send(serialized).await,
            Self::Browser(bridge) => bridge.send(serialized).await,
        }
    }

    /// Registers an inbound listener.
    pub fn add_listener(&self, listener: Listener) {
        match self {
            Self::Ios(bridge) => bridge.add_listener(listener),
            Self::Android(bridge) => bridge.add_listener(listener),
            Self::Browser(bridge) => bridge.add_listener(listener),
        }
    }

    /// Unregisters a listener by identity. Returns `false` if unknown.
    pub fn remove_listener(&self, listener: &Listener) -> bool {
        match self {
            Self::Ios(bridge) => bridge.remove_listener(listener),
            Self::Android(bridge) => bridge.remove_listener(listener),
            Self::Browser(bridge) => bridge.remove_listener(listener),
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        match self {
            Self::Ios(bridge) => bridge.listener_count(),
            Self::Android(bridge) => bridge.listener_count(),
            Self::Browser(bridge) => bridge.listener_count(),
        }
    }

    /// Platform this bridge serves.
    #[inline]
    #[must_use]
    pub fn platform(&self) -> Platform {
        match self {
            Self::Ios(_) => Platform::IosWebView,
            Self::Android(_) => Platform::AndroidWebView,
            Self::Browser(_) => Platform::Browser,
        }
    }

    /// Returns `true` for native host bridges.
    #[inline]
    #[must_use]
    pub fn is_native(&self) -> bool {
        self.platform().is_embedded()
    }

    /// Stops the inbound event loop and drops every listener.
    pub fn shutdown(&self) {
        match self {
            Self::Ios(bridge) => bridge.shutdown(),
            Self::Android(bridge) => bridge.shutdown(),
            Self::Browser(bridge) => bridge.shutdown(),
        }
    }
}

impl From<IosBridge> for Bridge {
    fn from(bridge: IosBridge) -> Self {
        Self::Ios(bridge)
    }
}

impl From<AndroidBridge> for Bridge {
    fn from(bridge: AndroidBridge) -> Self {
        Self::Android(bridge)
    }
}

impl From<BrowserBridge> for Bridge {
    fn from(bridge: BrowserBridge) -> Self {
        Self::Browser(bridge)
    }
}
