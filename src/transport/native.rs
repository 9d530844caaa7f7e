//! Native host channel shared by the iOS and Android bridges.
//!
//! Outbound messages go straight to the host entry point. Inbound messages
//! arrive as same-window message events that the host injects into the
//! document; only events stamped with a native source are forwarded.
//!
//! # Event Loop
//!
//! Each channel spawns one tokio task at construction that handles:
//!
//! - Same-window message events (filtered by source)
//! - Shutdown commands from the owning bridge

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::environment::{HostEntryPoint, Window, WindowMessage};
use crate::error::{Error, Result};
use crate::protocol::{RawMessage, Source};

use super::LoopCommand;
use super::listeners::{Listener, ListenerSet};

// ============================================================================
// NativeHost
// ============================================================================

/// Which native shell the channel talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NativeHost {
    Ios,
    Android,
}

impl NativeHost {
    /// Script path of the host entry point.
    pub(crate) fn entry_point_name(self) -> &'static str {
        match self {
            Self::Ios => "webkit.messageHandlers.postMessageHandler",
            Self::Android => "Android.postMessage",
        }
    }

    /// Returns `true` if an inbound message tagged `source` came from this host.
    pub(crate) fn accepts(self, source: &Source) -> bool {
        match self {
            Self::Ios => matches!(source, Source::Native | Source::Ios),
            Self::Android => matches!(source, Source::Native | Source::Android),
        }
    }

    fn entry_point(self, window: &Window) -> Result<Option<HostEntryPoint>> {
        match self {
            Self::Ios => window.ios_message_handler(),
            Self::Android => window.android_interface(),
        }
    }
}

// ============================================================================
// NativeChannel
// ============================================================================

/// Entry point caller plus inbound event loop for one native host.
pub(crate) struct NativeChannel {
    host: NativeHost,
    window: Window,
    listeners: ListenerSet,
    command_tx: mpsc::UnboundedSender<LoopCommand>,
}

impl NativeChannel {
    /// Subscribes to the window and spawns the inbound event loop.
    ///
    /// Must be called within a tokio runtime.
    pub(crate) fn new(host: NativeHost, window: Window) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let listeners = ListenerSet::default();

        tokio::spawn(Self::run_event_loop(
            host,
            window.subscribe_messages(),
            command_rx,
            listeners.clone(),
        ));

        debug!(entry_point = host.entry_point_name(), "Native bridge started");

        Self {
            host,
            window,
            listeners,
            command_tx,
        }
    }

    /// Hands `serialized` to the host entry point.
    ///
    /// The entry point is looked up on every call; the host may inject or
    /// withdraw it at any time.
    pub(crate) async fn send(&self, serialized: &str) -> Result<()> {
        let entry_point = self.host.entry_point_name();
        let handler = self
            .host
            .entry_point(&self.window)?
            .as_ref()
            .and_then(HostEntryPoint::handler)
            .cloned()
            .ok_or_else(|| {
                warn!(entry_point, "Native entry point unavailable");
                Error::transport_unavailable(entry_point)
            })?;

        trace!(entry_point, len = serialized.len(), "Posting to native host");

        handler
            .post_message(serialized.to_string())
            .await
            .map_err(|message| {
                warn!(entry_point, error = %message, "Native host rejected message");
                Error::native_call(message)
            })
    }

    pub(crate) fn add_listener(&self, listener: Listener) {
        self.listeners.add(listener);
    }

    pub(crate) fn remove_listener(&self, listener: &Listener) -> bool {
        self.listeners.remove(listener)
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Stops the event loop and drops every listener.
    pub(crate) fn shutdown(&self) {
        self.listeners.clear();
        let _ = self.command_tx.send(LoopCommand::Shutdown);
    }

    async fn run_event_loop(
        host: NativeHost,
        mut messages: Receiver<WindowMessage>,
        mut command_rx: mpsc::UnboundedReceiver<LoopCommand>,
        listeners: ListenerSet,
    ) {
        loop {
            tokio::select! {
                event = messages.recv() => {
                    match event {
                        Ok(message) => Self::handle_window_message(host, message, &listeners),

                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Native bridge lagged, messages dropped");
                        }

                        Err(RecvError::Closed) => {
                            debug!("Window message channel closed");
                            break;
                        }
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

        debug!(entry_point = host.entry_point_name(), "Native event loop terminated");
    }

    fn handle_window_message(host: NativeHost, message: WindowMessage, listeners: &ListenerSet) {
        let raw = RawMessage::from(message.data);

        match raw.source() {
            Some(source) if host.accepts(&source) => {
                trace!(source = source.as_str(), "Native message received");
                listeners.dispatch(&raw);
            }
            source => {
                trace!(?source, "Ignoring window message without native source");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
