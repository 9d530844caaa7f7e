//! Browser fallback bridge.
//!
//! Without a native host, messages are relayed between tabs of the same
//! origin through one shared storage slot and echoed to the current window
//! as a same-window message event.
//!
//! # Channels
//!
//! | Direction | Mechanism |
//! |-----------|-----------|
//! | Outbound | write [`STORAGE_KEY`], then post to own origin |
//! | Inbound | storage events from other tabs, same-origin window messages |
//!
//! Every delivered object is re-tagged `source = "browser"`; non-object data
//! passes through untouched and is tagged by the service. The slot holds
//! only the most recent message; rapid sends from several tabs overwrite each
//! other.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde_json::{Map, Value};
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

use crate::environment::{StorageEvent, Window, WindowMessage};
use crate::error::Result;
use crate::identifiers::WindowId;
use crate::protocol::{RawMessage, Source};

use super::LoopCommand;
use super::listeners::{Listener, ListenerSet};

// ============================================================================
// Constants
// ============================================================================

/// Storage slot used as the cross-tab buffer.
pub const STORAGE_KEY: &str = "browser_messages";

// ============================================================================
// BrowserBridge
// ============================================================================

/// Transport between tabs of one origin.
pub struct BrowserBridge {
    window: Window,
    listeners: ListenerSet,
    command_tx: mpsc::UnboundedSender<LoopCommand>,
}

impl fmt::Debug for BrowserBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserBridge")
            .field("window", &self.window.id())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl BrowserBridge {
    /// Creates the bridge and starts its inbound event loop.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn new(window: Window) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let listeners = ListenerSet::default();

        tokio::spawn(Self::run_event_loop(
            InboundContext {
                window_id: window.id(),
                origin: window.origin().to_string(),
                listeners: listeners.clone(),
            },
            window.subscribe_storage(),
            window.subscribe_messages(),
            command_rx,
        ));

        debug!(window = %window.id(), origin = window.origin(), "Browser bridge started");

        Self {
            window,
            listeners,
            command_tx,
        }
    }

    /// Writes `serialized` to the shared slot and posts it to this window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`](crate::Error::Storage) if the storage area
    /// rejects the write; nothing is posted in that case.
    pub async fn send(&self, serialized: &str) -> Result<()> {
        self.window
            .local_storage()
            .set_item(self.window.id(), STORAGE_KEY, serialized)
            .inspect_err(|e| error!(error = %e, "Failed to send browser message"))?;

        self.window
            .post_message(Value::String(serialized.to_string()), self.window.origin());

        trace!(len = serialized.len(), "Browser message relayed");
        Ok(())
    }

    /// Registers an inbound listener.
    pub fn add_listener(&self, listener: Listener) {
        self.listeners.add(listener);
    }

    /// Unregisters a listener.
    pub fn remove_listener(&self, listener: &Listener) -> bool {
        self.listeners.remove(listener)
    }

    /// Number of registered listeners.
    #[inline]
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Stops the inbound event loop and drops every listener.
    pub fn shutdown(&self) {
        self.listeners.clear();
        let _ = self.command_tx.send(LoopCommand::Shutdown);
    }

    async fn run_event_loop(
        context: InboundContext,
        mut storage: Receiver<StorageEvent>,
        mut messages: Receiver<WindowMessage>,
        mut command_rx: mpsc::UnboundedReceiver<LoopCommand>,
    ) {
        loop {
            tokio::select! {
                event = storage.recv() => {
                    match event {
                        Ok(event) => context.handle_storage_event(event),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Storage events lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }

                event = messages.recv() => {
                    match event {
                        Ok(message) => context.handle_window_message(message),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Window messages lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(LoopCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            break;
                        }
                        None => {
                            debug!("Bridge dropped");
                            break;
                        }
                    }
                }
            }
        }

        debug!(window = %context.window_id, "Browser event loop terminated");
    }
}

// ============================================================================
// InboundContext
// ============================================================================

/// State the event loop needs to filter and deliver inbound events.
struct InboundContext {
    window_id: WindowId,
    origin: String,
    listeners: ListenerSet,
}

impl InboundContext {
    fn handle_storage_event(&self, event: StorageEvent) {
        if event.key != STORAGE_KEY || !event.is_visible_to(self.window_id) {
            return;
        }

        let Some(new_value) = event.new_value else {
            trace!("Storage slot cleared");
            return;
        };

        match serde_json::from_str::<Value>(&new_value) {
            Ok(Value::Object(object)) => self.deliver(object),
            Ok(_) => error!("Failed to parse message from storage: not a JSON object"),
            Err(e) => error!(error = %e, "Failed to parse message from storage"),
        }
    }

    fn handle_window_message(&self, message: WindowMessage) {
        if message.origin != self.origin {
            trace!(origin = %message.origin, "Ignoring foreign-origin message");
            return;
        }

        let raw = RawMessage::from(message.data);
        let Some(object) = raw.to_object() else {
            // Not an object; nothing to re-tag.
            self.listeners.dispatch(&raw);
            return;
        };

        if raw.source() == Some(Source::Webview) {
            trace!("Suppressing echo of own outgoing message");
            return;
        }

        self.deliver(object);
    }

    fn deliver(&self, mut object: Map<String, Value>) {
        object.insert(
            "source".to_string(),
            Value::String(Source::Browser.as_str().to_string()),
        );
        self.listeners.dispatch(&RawMessage::Json(Value::Object(object)));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use crate::environment::SharedStorage;
    use crate::error::Error;

    fn channel_listener() -> (Listener, mpsc::UnboundedReceiver<RawMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener: Listener = Arc::new(move |raw| {
            let _ = tx.send(raw);
        });
        (listener, rx)
    }

    async fn assert_silent(rx: &mut mpsc::UnboundedReceiver<RawMessage>) {
        let result = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(result.is_err(), "unexpected delivery: {result:?}");
    }

    #[tokio::test]
    async fn test_send_writes_slot_and_posts() {
        let window = Window::new();
        let mut posted = window.subscribe_messages();
        let bridge = BrowserBridge::new(window.clone());

        let text = r#"{"type":"TEST"}"#;
        bridge.send(text).await.expect("send");

        assert_eq!(window.local_storage().get_item(STORAGE_KEY).as_deref(), Some(text));
        let message = posted.recv().await.expect("posted");
        assert_eq!(message.data, json!(text));
        assert_eq!(message.origin, window.origin());
    }

    #[tokio::test]
    async fn test_send_propagates_storage_failure() {
        let window = Window::builder().storage(SharedStorage::with_quota(8)).build();
        let mut posted = window.subscribe_messages();
        let bridge = BrowserBridge::new(window);

        let err = bridge.send(r#"{"type":"TOO_LONG"}"#).await.unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
        assert!(posted.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_storage_event_from_sibling_is_retagged() {
        let window = Window::new();
        let sibling = window.open_sibling();
        let bridge = BrowserBridge::new(window);
        let (listener, mut rx) = channel_listener();
        bridge.add_listener(listener);

        sibling
            .local_storage()
            .set_item(sibling.id(), STORAGE_KEY, r#"{"type":"TEST","payload":"test data"}"#)
            .expect("set");

        let received = rx.recv().await.expect("delivered");
        assert_eq!(
            received,
            RawMessage::Json(json!({"type": "TEST", "payload": "test data", "source": "browser"}))
        );
    }

    #[tokio::test]
    async fn test_invalid_storage_values_are_dropped() {
        let window = Window::new();
        let sibling = window.open_sibling();
        let bridge = BrowserBridge::new(window);
        let (listener, mut rx) = channel_listener();
        bridge.add_listener(listener);

        let storage = sibling.local_storage();
        storage.set_item(sibling.id(), STORAGE_KEY, "invalid json").expect("set");
        storage.set_item(sibling.id(), STORAGE_KEY, "[1,2]").expect("set");
        storage.remove_item(sibling.id(), STORAGE_KEY);
        storage.set_item(sibling.id(), "other_key", r#"{"type":"X"}"#).expect("set");

        assert_silent(&mut rx).await;
    }

    #[tokio::test]
    async fn test_own_storage_writes_are_invisible() {
        let window = Window::new();
        let bridge = BrowserBridge::new(window.clone());
        let (listener, mut rx) = channel_listener();
        bridge.add_listener(listener);

        window
            .local_storage()
            .set_item(window.id(), STORAGE_KEY, r#"{"type":"SELF"}"#)
            .expect("set");

        assert_silent(&mut rx).await;
    }

    #[tokio::test]
    async fn test_same_origin_window_message_is_retagged() {
        let window = Window::new();
        let bridge = BrowserBridge::new(window.clone());
        let (listener, mut rx) = channel_listener();
        bridge.add_listener(listener);

        window.post_message(json!({"type": "TEST", "payload": "test data"}), window.origin());

        let received = rx.recv().await.expect("delivered");
        assert_eq!(
            received,
            RawMessage::Json(json!({"type": "TEST", "payload": "test data", "source": "browser"}))
        );
    }

    #[tokio::test]
    async fn test_own_send_does_not_echo() {
        let window = Window::new();
        let bridge = BrowserBridge::new(window);
        let (listener, mut rx) = channel_listener();
        bridge.add_listener(listener);

        bridge
            .send(r#"{"type":"PING","source":"webview"}"#)
            .await
            .expect("send");

        assert_silent(&mut rx).await;
    }

    #[tokio::test]
    async fn test_plain_text_window_message_passes_through() {
        let window = Window::new();
        let bridge = BrowserBridge::new(window.clone());
        let (listener, mut rx) = channel_listener();
        bridge.add_listener(listener);

        window.post_message(json!("hello"), window.origin());

        assert_eq!(rx.recv().await, Some(RawMessage::Text("hello".to_string())));
    }

    #[tokio::test]
    async fn test_removed_listener_is_not_called() {
        let window = Window::new();
        let bridge = BrowserBridge::new(window.clone());
        let (listener, mut rx) = channel_listener();
        bridge.add_listener(Arc::clone(&listener));
        assert!(bridge.remove_listener(&listener));
        drop(listener);

        window.post_message(json!({"type": "TEST"}), window.origin());
        assert!(rx.recv().await.is_none());
    }
}
