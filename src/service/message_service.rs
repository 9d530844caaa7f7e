//! Publish/subscribe message service.
//!
//! Wraps one [`Bridge`] and adds typing, filtering, send timeout, loop
//! prevention and teardown.
//!
//! # Lifecycle
//!
//! | State | Meaning |
//! |-------|---------|
//! | `Initialized` | Created; no listener on the bridge yet |
//! | `Active` | Listener attached by the first `send` or `on_message` |
//! | `Destroyed` | Sends fail, subscriptions end, bridge stopped |
//!
//! No transition leads back from `Destroyed`.
//!
//! # Inbound Pipeline
//!
//! ```text
//! RawMessage ─► into_message ─► drop source == webview ─► broadcast ─► filter(type)
//!                   │
//!                   ├─ invalid: logged and dropped
//!                   └─ untagged on the browser bridge: tagged browser
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::environment::Window;
use crate::error::{Error, Result};
use crate::platform::Platform;
use crate::protocol::{Message, RawMessage, Source};
use crate::transport::{Bridge, BridgeFactory, Listener};

use super::config::{MessageServiceConfig, SendPolicy};
use super::subscription::MessageSubscription;

// ============================================================================
// ServiceState
// ============================================================================

/// Lifecycle state of a [`MessageService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Created, not yet listening.
    Initialized,
    /// Sending and receiving.
    Active,
    /// Torn down.
    Destroyed,
}

// ============================================================================
// MessageService
// ============================================================================

/// Typed messaging over the selected bridge.
///
/// Cloning is cheap; clones share the same service. [`destroy`](Self::destroy)
/// affects every clone.
///
/// # Example
///
/// ```ignore
/// use webview_bridge::{MessageService, MessageServiceConfig, Window};
///
/// let service = MessageService::for_window(&window, MessageServiceConfig::new())?;
/// let mut replies = service.on_message(Some("RECEIVED"));
///
/// service.send("PING", Some(serde_json::json!({"n": 1}))).await?;
/// let reply = replies.recv().await;
/// ```
#[derive(Clone)]
pub struct MessageService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    bridge: Bridge,
    config: MessageServiceConfig,
    state: Mutex<ServiceState>,
    /// `None` once destroyed; dropping the sender ends every subscription.
    events: RwLock<Option<broadcast::Sender<Message>>>,
    /// Listener registered on the bridge while active.
    listener: Mutex<Option<Listener>>,
    /// Flips to `true` on teardown; pending sends watch it.
    shutdown: watch::Sender<bool>,
}

impl fmt::Debug for MessageService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageService")
            .field("platform", &self.platform())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// MessageService - Constructors
// ============================================================================

impl MessageService {
    /// Creates a service over `bridge`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` is invalid.
    pub fn new(bridge: Bridge, config: MessageServiceConfig) -> Result<Self> {
        config.validate()?;

        let (events, _) = broadcast::channel(config.channel_capacity);
        let (shutdown, _) = watch::channel(false);

        debug!(platform = %bridge.platform(), "Message service created");

        Ok(Self {
            inner: Arc::new(ServiceInner {
                bridge,
                config,
                state: Mutex::new(ServiceState::Initialized),
                events: RwLock::new(Some(events)),
                listener: Mutex::new(None),
                shutdown,
            }),
        })
    }

    /// Detects the platform of `window` and creates a service over the
    /// matching bridge.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` is invalid.
    pub fn for_window(window: &Window, config: MessageServiceConfig) -> Result<Self> {
        let bridge = BridgeFactory::for_window(window.clone()).create_bridge();
        Self::new(bridge, config)
    }
}

// ============================================================================
// MessageService - Accessors
// ============================================================================

impl MessageService {
    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ServiceState {
        *self.inner.state.lock()
    }

    /// Platform of the underlying bridge.
    #[inline]
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.inner.bridge.platform()
    }

    /// Returns `true` if a native host is present.
    #[inline]
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.inner.bridge.is_native()
    }

    /// Active configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MessageServiceConfig {
        &self.inner.config
    }

    /// Underlying bridge.
    #[inline]
    #[must_use]
    pub fn bridge(&self) -> &Bridge {
        &self.inner.bridge
    }
}

// ============================================================================
// MessageService - Sending
// ============================================================================

impl MessageService {
    /// Sends a message of `message_type` to the host.
    ///
    /// The message is stamped with the current time and `source = webview`.
    /// A single attempt is made; nothing is retried.
    ///
    /// # Errors
    ///
    /// - [`Error::ServiceDestroyed`] after [`destroy`](Self::destroy)
    /// - [`Error::Validation`] if `message_type` is empty
    /// - [`Error::NotEmbedded`] under [`SendPolicy::RequireEmbedded`] without a native host
    /// - [`Error::Timeout`] if the bridge does not confirm within the send timeout
    /// - [`Error::Cancelled`] if the service is destroyed while sending
    /// - Transport errors from the bridge, unchanged
    pub async fn send(&self, message_type: &str, payload: Option<Value>) -> Result<()> {
        let serialized = self.prepare(message_type, payload)?;
        let send_timeout = self.inner.config.send_timeout;
        let mut shutdown_rx = self.inner.shutdown.subscribe();

        tokio::select! {
            result = timeout(send_timeout, self.inner.bridge.send(&serialized)) => {
                match result {
                    Ok(Ok(())) => {
                        trace!(message_type, "Message sent");
                        Ok(())
                    }
                    Ok(Err(e)) => {
                        warn!(message_type, error = %e, "Send failed");
                        Err(e)
                    }
                    Err(_) => {
                        let timeout_ms = self.inner.config.send_timeout_ms();
                        warn!(message_type, timeout_ms, "Send timed out");
                        Err(Error::timeout(format!("send {message_type}"), timeout_ms))
                    }
                }
            }

            _ = shutdown_rx.wait_for(|destroyed| *destroyed) => {
                debug!(message_type, "Send cancelled by teardown");
                Err(Error::Cancelled)
            }
        }
    }

    /// Sends a message whose payload is any serializable value.
    ///
    /// # Errors
    ///
    /// [`Error::Json`] if `payload` cannot be serialized, otherwise as
    /// [`send`](Self::send).
    pub async fn send_payload<T>(&self, message_type: &str, payload: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(payload)?;
        self.send(message_type, Some(payload)).await
    }

    /// Runs the pre-send checks and serializes the message.
    fn prepare(&self, message_type: &str, payload: Option<Value>) -> Result<String> {
        if self.state() == ServiceState::Destroyed {
            return Err(Error::ServiceDestroyed);
        }

        if message_type.is_empty() {
            return Err(Error::validation("message type must not be empty"));
        }

        if self.inner.config.send_policy == SendPolicy::RequireEmbedded
            && !self.inner.bridge.is_native()
        {
            debug!(message_type, "Refusing send outside an embedded WebView");
            return Err(Error::NotEmbedded);
        }

        self.activate();

        Message::outgoing(message_type, payload, Source::Webview).to_json()
    }
}

// ============================================================================
// MessageService - Receiving
// ============================================================================

impl MessageService {
    /// Subscribes to inbound messages, optionally only those of `message_type`.
    ///
    /// Each call returns an independent subscription. After
    /// [`destroy`](Self::destroy) the subscription is already closed.
    #[must_use]
    pub fn on_message(&self, message_type: Option<&str>) -> MessageSubscription {
        self.activate();

        let receiver = self.inner.events.read().as_ref().map(broadcast::Sender::subscribe);
        MessageSubscription::new(receiver, message_type.map(str::to_string))
    }

    /// Attaches the inbound listener on first use.
    fn activate(&self) {
        let mut state = self.inner.state.lock();
        if *state != ServiceState::Initialized {
            return;
        }

        let listener = Self::inbound_listener(Arc::downgrade(&self.inner));
        self.inner.bridge.add_listener(Arc::clone(&listener));
        *self.inner.listener.lock() = Some(listener);
        *state = ServiceState::Active;

        debug!(platform = %self.inner.bridge.platform(), "Message service active");
    }

    fn inbound_listener(service: Weak<ServiceInner>) -> Listener {
        Arc::new(move |raw| {
            if let Some(inner) = service.upgrade() {
                inner.dispatch(raw);
            }
        })
    }
}

impl ServiceInner {
    fn dispatch(&self, raw: RawMessage) {
        let mut message = match raw.into_message(self.config.wrap_plain_text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Dropping invalid inbound message");
                return;
            }
        };

        // Wrapped plain text carries no tag of its own.
        if message.source.is_none() && self.bridge.platform() == Platform::Browser {
            message.source = Some(Source::Browser);
        }

        if message.source == Some(Source::Webview) {
            trace!(message_type = %message.message_type, "Dropping own message");
            return;
        }

        let events = self.events.read();
        let Some(events) = events.as_ref() else {
            return;
        };

        let message_type = message.message_type.clone();
        let receivers = events.send(message).unwrap_or(0);
        trace!(%message_type, receivers, "Inbound message dispatched");
    }
}

// ============================================================================
// MessageService - Teardown
// ============================================================================

impl MessageService {
    /// Tears the service down. Safe to call more than once.
    ///
    /// Pending sends resolve with [`Error::Cancelled`], subscriptions end,
    /// the bridge listener is removed and the bridge event loop stops.
    pub fn destroy(&self) {
        {
            let mut state = self.inner.state.lock();
            if *state == ServiceState::Destroyed {
                return;
            }
            *state = ServiceState::Destroyed;
        }

        self.inner.shutdown.send_replace(true);

        if let Some(listener) = self.inner.listener.lock().take() {
            self.inner.bridge.remove_listener(&listener);
        }
        self.inner.bridge.shutdown();
        self.inner.events.write().take();

        debug!(platform = %self.inner.bridge.platform(), "Message service destroyed");
    }
}

// ============================================================================
// Tests
// ============================================================================
