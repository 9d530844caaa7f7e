//! iOS `WKWebView` bridge.
//!
//! Sends through `webkit.messageHandlers.postMessageHandler.postMessage`.
//! Receives same-window messages tagged `native` or `ios`.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::environment::Window;
use crate::error::Result;

use super::listeners::Listener;
use super::native::{NativeChannel, NativeHost};

// ============================================================================
// IosBridge
// ============================================================================

/// Transport to an iOS host.
pub struct IosBridge {
    channel: NativeChannel,
}

impl fmt::Debug for IosBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IosBridge")
            .field("listeners", &self.channel.listener_count())
            .finish_non_exhaustive()
    }
}

impl IosBridge {
    /// Creates the bridge and starts its inbound event loop.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self {
            channel: NativeChannel::new(NativeHost::Ios, window),
        }
    }

    /// Posts `serialized` to the iOS message handler.
    ///
    /// # Errors
    ///
    /// - [`Error::TransportUnavailable`](crate::Error::TransportUnavailable) if the handler is missing
    /// - [`Error::NativeCall`](crate::Error::NativeCall) if the handler reports a failure
    /// - [`Error::WindowClosed`](crate::Error::WindowClosed) if the window was closed
    pub async fn send(&self, serialized: &str) -> Result<()> {
        self.channel.send(serialized).await
    }

    /// Registers an inbound listener.
    pub fn add_listener(&self, listener: Listener) {
        self.channel.add_listener(listener);
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, listener: &Listener) -> bool {
        self.channel.remove_listener(listener)
    }

    /// Number of registered listeners.
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

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use serde_json::json;
    use tokio::sync::mpsc;

    use crate::environment::{ANY_ORIGIN, HostEntryPoint};
    use crate::error::Error;
    use crate::protocol::RawMessage;

    fn recording_window() -> (Window, Arc<Mutex<Vec<String>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&sent);
        let window = Window::builder()
            .ios_handler(HostEntryPoint::from_fn(move |message| {
                sink.lock().push(message);
                Ok(())
            }))
            .build();
        (window, sent)
    }

    fn channel_listener() -> (Listener, mpsc::UnboundedReceiver<RawMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener: Listener = Arc::new(move |raw| {
            let _ = tx.send(raw);
        });
        (listener, rx)
    }

    #[tokio::test]
    async fn test_send_calls_message_handler() {
        let (window, sent) = recording_window();
        let bridge = IosBridge::new(window);

        bridge.send(r#"{"type":"TEST"}"#).await.expect("send");

        assert_eq!(sent.lock().as_slice(), [r#"{"type":"TEST"}"#.to_string()]);
    }

    #[tokio::test]
    async fn test_send_without_handler_fails() {
        let bridge = IosBridge::new(Window::new());

        let err = bridge.send("{}").await.unwrap_err();
        assert!(matches!(err, Error::TransportUnavailable { .. }));
        assert!(err.is_transport_error());
    }

    #[tokio::test]
    async fn test_send_with_uncallable_handler_fails() {
        let window = Window::builder()
            .ios_handler(HostEntryPoint::Uncallable(json!({})))
            .build();
        let bridge = IosBridge::new(window);

        let err = bridge.send("{}").await.unwrap_err();
        assert!(matches!(err, Error::TransportUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_send_reports_handler_failure() {
        let window = Window::builder()
            .ios_handler(HostEntryPoint::from_fn(|_| Err("handler threw".to_string())))
            .build();
        let bridge = IosBridge::new(window);

        let err = bridge.send("{}").await.unwrap_err();
        assert!(matches!(err, Error::NativeCall { ref message } if message == "handler threw"));
    }

    #[tokio::test]
    async fn test_receives_native_and_ios_messages() {
        let (window, _) = recording_window();
        let bridge = IosBridge::new(window.clone());
        let (listener, mut rx) = channel_listener();
        bridge.add_listener(listener);

        window.post_message(json!({"type": "A", "source": "native"}), ANY_ORIGIN);
        window.post_message(json!({"type": "B", "source": "android"}), ANY_ORIGIN);
        window.post_message(json!(r#"{"type":"C","source":"ios"}"#), ANY_ORIGIN);

        let first = rx.recv().await.expect("first");
        assert_eq!(first, RawMessage::Json(json!({"type": "A", "source": "native"})));

        let second = rx.recv().await.expect("second");
        assert_eq!(second, RawMessage::Text(r#"{"type":"C","source":"ios"}"#.to_string()));
    }

    #[tokio::test]
    async fn test_ignores_untagged_messages() {
        let (window, _) = recording_window();
        let bridge = IosBridge::new(window.clone());
        let (listener, mut rx) = channel_listener();
        bridge.add_listener(listener);

        window.post_message(json!({"type": "A"}), ANY_ORIGIN);
        window.post_message(json!({"type": "B", "source": "webview"}), ANY_ORIGIN);

        let result = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_clears_listeners() {
        let (window, _) = recording_window();
        let bridge = IosBridge::new(window.clone());
        let (listener, mut rx) = channel_listener();
        bridge.add_listener(listener);

        bridge.shutdown();
        assert_eq!(bridge.listener_count(), 0);

        window.post_message(json!({"type": "A", "source": "native"}), ANY_ORIGIN);
        assert!(rx.recv().await.is_none());
    }
}
