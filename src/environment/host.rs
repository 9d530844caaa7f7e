//! Native host entry points.
//!
//! A native shell exposes a callable object to the document: WebKit's
//! `webkit.messageHandlers.postMessageHandler.postMessage` on iOS, the
//! `Android.postMessage` JavaScript interface on Android. Either may be
//! missing, or present but not callable.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

// ============================================================================
// NativeHandler
// ============================================================================

/// A host-side receiver for serialized messages.
///
/// Implemented by the embedding shell. Resolves once the host has accepted
/// the message; an `Err` carries the host's failure description.
#[async_trait]
pub trait NativeHandler: Send + Sync {
    /// Delivers one serialized message to the host.
    async fn post_message(&self, message: String) -> Result<(), String>;
}

/// Adapts a synchronous closure into a [`NativeHandler`].
struct FnHandler<F>(F);

#[async_trait]
impl<F> NativeHandler for FnHandler<F>
where
    F: Fn(String) -> Result<(), String> + Send + Sync,
{
    async fn post_message(&self, message: String) -> Result<(), String> {
        (self.0)(message)
    }
}

// ============================================================================
// HostEntryPoint
// ============================================================================

/// A host-exposed entry point as the document sees it.
#[derive(Clone)]
pub enum HostEntryPoint {
    /// A callable entry point.
    Callable(Arc<dyn NativeHandler>),
    /// Present, but not a function (e.g. a string or an empty object).
    Uncallable(Value),
}

impl HostEntryPoint {
    /// Wraps a handler implementation.
    #[inline]
    #[must_use]
    pub fn callable(handler: impl NativeHandler + 'static) -> Self {
        Self::Callable(Arc::new(handler))
    }

    /// Wraps a synchronous closure.
    #[inline]
    #[must_use]
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(String) -> Result<(), String> + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(FnHandler(f)))
    }

    /// Returns `true` if the entry point can be invoked.
    #[inline]
    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Callable(_))
    }

    /// Returns the handler if the entry point is callable.
    #[inline]
    #[must_use]
    pub fn handler(&self) -> Option<&Arc<dyn NativeHandler>> {
        match self {
            Self::Callable(handler) => Some(handler),
            Self::Uncallable(_) => None,
        }
    }
}

impl fmt::Debug for HostEntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(_) => f.write_str("HostEntryPoint::Callable"),
            Self::Uncallable(value) => f.debug_tuple("HostEntryPoint::Uncallable").field(value).finish(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
