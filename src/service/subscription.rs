//! Filtered message subscriptions.

// ============================================================================
// Imports
// ============================================================================

use futures_util::Stream;
use futures_util::stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

use crate::protocol::Message;

// ============================================================================
// MessageSubscription
// ============================================================================

/// Stream of inbound messages, optionally restricted to one type.
///
/// Ends (`recv` returns `None`) when the service is destroyed. Dropping the
/// subscription unsubscribes.
#[derive(Debug)]
pub struct MessageSubscription {
    receiver: Option<broadcast::Receiver<Message>>,
    filter: Option<String>,
}

impl MessageSubscription {
    pub(crate) fn new(receiver: Option<broadcast::Receiver<Message>>, filter: Option<String>) -> Self {
        Self { receiver, filter }
    }

    /// Type filter, if any.
    #[inline]
    #[must_use]
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Returns `true` once the service has been torn down.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.receiver.is_none()
    }

    /// Waits for the next matching message.
    ///
    /// Returns `None` once the service is destroyed. If this subscriber fell
    /// behind, the skipped messages are logged and dropped.
    pub async fn recv(&mut self) -> Option<Message> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(message) if self.matches(&message) => return Some(message),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, filter = ?self.filter, "Subscriber lagged, messages dropped");
                }
                Err(RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Returns the next matching message if one is already buffered.
    pub fn try_recv(&mut self) -> Option<Message> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.try_recv() {
                Ok(message) if self.matches(&message) => return Some(message),
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, filter = ?self.filter, "Subscriber lagged, messages dropped");
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Adapts the subscription into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Message> + Send + Unpin {
        Box::pin(stream::unfold(self, |mut subscription| async move {
            let message = subscription.recv().await?;
            Some((message, subscription))
        }))
    }

    fn matches(&self, message: &Message) -> bool {
        self.filter.as_deref().is_none_or(|t| message.is(t))
    }
}

// ============================================================================
// Tests
// ============================================================================
