//! Browsing window that hosts the document.
//!
//! Each [`Window`] owns:
//! - Its origin and user-agent string
//! - The native entry points the shell injected (if any)
//! - A same-window message event channel
//! - A handle to the origin's [`SharedStorage`]
//!
//! # Example
//!
//! ```no_run
//! use webview_bridge::environment::{HostEntryPoint, SharedStorage, Window};
//!
//! let storage = SharedStorage::new();
//! let window = Window::builder()
//!     .origin("https://app.example")
//!     .storage(storage.clone())
//!     .android_interface(HostEntryPoint::from_fn(|json| {
//!         println!("host received {json}");
//!         Ok(())
//!     }))
//!     .build();
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::WindowId;

use super::host::HostEntryPoint;
use super::storage::{SharedStorage, StorageEvent};

// ============================================================================
// Constants
// ============================================================================

/// Default document origin.
pub const DEFAULT_ORIGIN: &str = "http://localhost";

/// Target origin that matches any window.
pub const ANY_ORIGIN: &str = "*";

/// Capacity of the same-window message channel.
const MESSAGE_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// WindowMessage
// ============================================================================

/// A same-window message event.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowMessage {
    /// Posted data, either a string or a structured value.
    pub data: Value,
    /// Origin of the posting context.
    pub origin: String,
}

// ============================================================================
// Window
// ============================================================================

/// Handle to a browsing window.
///
/// Cloning is cheap; clones refer to the same window.
#[derive(Clone)]
pub struct Window {
    inner: Arc<WindowInner>,
}

struct WindowInner {
    id: WindowId,
    origin: String,
    user_agent: RwLock<Option<String>>,
    standalone: AtomicBool,
    ios_handler: RwLock<Option<HostEntryPoint>>,
    android_interface: RwLock<Option<HostEntryPoint>>,
    storage: SharedStorage,
    messages: broadcast::Sender<WindowMessage>,
    closed: AtomicBool,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.inner.id)
            .field("origin", &self.inner.origin)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Window - Constructors
// ============================================================================

impl Window {
    /// Creates a window with default settings and its own storage area.
    #[must_use]
    pub fn new() -> Self {
        WindowBuilder::new().build()
    }

    /// Creates a builder for configuring a window.
    #[inline]
    #[must_use]
    pub fn builder() -> WindowBuilder {
        WindowBuilder::new()
    }

    /// Opens another window (tab) sharing this window's origin and storage.
    #[must_use]
    pub fn open_sibling(&self) -> Self {
        Self::builder()
            .origin(self.inner.origin.clone())
            .storage(self.inner.storage.clone())
            .build()
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Window - Accessors
// ============================================================================

impl Window {
    /// Returns the window ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> WindowId {
        self.inner.id
    }

    /// Returns the document origin.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.inner.origin
    }

    /// Returns the storage area of this window's origin.
    #[inline]
    #[must_use]
    pub fn local_storage(&self) -> &SharedStorage {
        &self.inner.storage
    }

    /// Returns the user-agent string, if any.
    #[must_use]
    pub fn user_agent(&self) -> Option<String> {
        self.inner.user_agent.read().clone()
    }

    /// Replaces the user-agent string.
    pub fn set_user_agent(&self, user_agent: Option<String>) {
        *self.inner.user_agent.write() = user_agent;
    }

    /// Returns `true` if running as a home-screen web app (iOS `standalone`).
    #[inline]
    #[must_use]
    pub fn is_standalone(&self) -> bool {
        self.inner.standalone.load(Ordering::Acquire)
    }

    /// Returns `true` once [`Window::close`] was called.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Closes the window; later entry point probes fail.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            debug!(window = %self.inner.id, "Window closed");
        }
    }
}

// ============================================================================
// Window - Host Entry Points
// ============================================================================

impl Window {
    /// Returns `webkit.messageHandlers.postMessageHandler`, if injected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WindowClosed`] if the window was closed.
    pub fn ios_message_handler(&self) -> Result<Option<HostEntryPoint>> {
        self.ensure_open()?;
        Ok(self.inner.ios_handler.read().clone())
    }

    /// Returns the `Android` JavaScript interface, if injected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WindowClosed`] if the window was closed.
    pub fn android_interface(&self) -> Result<Option<HostEntryPoint>> {
        self.ensure_open()?;
        Ok(self.inner.android_interface.read().clone())
    }

    /// Installs or removes the iOS message handler.
    pub fn set_ios_message_handler(&self, entry: Option<HostEntryPoint>) {
        *self.inner.ios_handler.write() = entry;
    }

    /// Installs or removes the Android interface.
    pub fn set_android_interface(&self, entry: Option<HostEntryPoint>) {
        *self.inner.android_interface.write() = entry;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::WindowClosed);
        }
        Ok(())
    }
}

// ============================================================================
// Window - Events
// ============================================================================

impl Window {
    /// Posts a same-window message event.
    ///
    /// Delivered only if `target_origin` is [`ANY_ORIGIN`] or equals this
    /// window's origin; otherwise the message is discarded.
    pub fn post_message(&self, data: Value, target_origin: &str) {
        if target_origin != ANY_ORIGIN && target_origin != self.inner.origin {
            debug!(
                target_origin,
                origin = %self.inner.origin,
                "Discarding message for foreign target origin"
            );
            return;
        }

        trace!(window = %self.inner.id, "Posting window message");
        let _ = self.inner.messages.send(WindowMessage {
            data,
            origin: self.inner.origin.clone(),
        });
    }

    /// Subscribes to same-window message events.
    #[must_use]
    pub fn subscribe_messages(&self) -> broadcast::Receiver<WindowMessage> {
        self.inner.messages.subscribe()
    }

    /// Subscribes to storage change notifications of this window's origin.
    ///
    /// Callers filter with [`StorageEvent::is_visible_to`].
    #[must_use]
    pub fn subscribe_storage(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.storage.subscribe()
    }
}

// ============================================================================
// WindowBuilder
// ============================================================================

/// Builder for configuring a [`Window`].
#[derive(Debug, Default, Clone)]
pub struct WindowBuilder {
    origin: Option<String>,
    user_agent: Option<String>,
    standalone: bool,
    storage: Option<SharedStorage>,
    ios_handler: Option<HostEntryPoint>,
    android_interface: Option<HostEntryPoint>,
}

impl WindowBuilder {
    /// Creates a builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document origin (default [`DEFAULT_ORIGIN`]).
    #[inline]
    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Sets the user-agent string.
    #[inline]
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Marks the window as a home-screen web app.
    #[inline]
    #[must_use]
    pub fn standalone(mut self) -> Self {
        self.standalone = true;
        self
    }

    /// Shares an existing storage area (for sibling tabs).
    #[inline]
    #[must_use]
    pub fn storage(mut self, storage: SharedStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Injects the iOS message handler.
    #[inline]
    #[must_use]
    pub fn ios_handler(mut self, entry: HostEntryPoint) -> Self {
        self.ios_handler = Some(entry);
        self
    }

    /// Injects the Android JavaScript interface.
    #[inline]
    #[must_use]
    pub fn android_interface(mut self, entry: HostEntryPoint) -> Self {
        self.android_interface = Some(entry);
        self
    }

    /// Builds the window.
    #[must_use]
    pub fn build(self) -> Window {
        let (messages, _) = broadcast::channel(MESSAGE_CHANNEL_CAPACITY);
        let id = WindowId::generate();
        let origin = self.origin.unwrap_or_else(|| DEFAULT_ORIGIN.to_string());

        debug!(window = %id, origin = %origin, "Window created");

        Window {
            inner: Arc::new(WindowInner {
                id,
                origin,
                user_agent: RwLock::new(self.user_agent),
                standalone: AtomicBool::new(self.standalone),
                ios_handler: RwLock::new(self.ios_handler),
                android_interface: RwLock::new(self.android_interface),
                storage: self.storage.unwrap_or_default(),
                messages,
                closed: AtomicBool::new(false),
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
