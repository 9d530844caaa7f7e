//! Error types for the WebView message bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use webview_bridge::{MessageService, Result};
//!
//! async fn ping(service: &MessageService) -> Result<()> {
//!     service.send("PING", None).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Transport | [`Error::TransportUnavailable`], [`Error::NativeCall`], [`Error::Storage`] |
//! | Policy | [`Error::NotEmbedded`], [`Error::ServiceDestroyed`] |
//! | Wire format | [`Error::Json`], [`Error::Validation`] |
//! | Execution | [`Error::Timeout`], [`Error::Cancelled`] |
//! | Environment | [`Error::WindowClosed`], [`Error::ListenerRegistration`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when service configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Host entry point absent or not callable at send time.
    #[error("Transport unavailable: {entry_point} is not callable")]
    TransportUnavailable {
        /// Name of the missing host entry point.
        entry_point: String,
    },

    /// The host entry point was called and reported a failure.
    #[error("Native call failed: {message}")]
    NativeCall {
        /// Failure reported by the host.
        message: String,
    },

    /// Shared storage rejected the write (e.g. quota exceeded).
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    // ========================================================================
    // Policy Errors
    // ========================================================================
    /// The service requires an embedded WebView host but runs in a browser.
    #[error("Not running inside an embedded WebView host")]
    NotEmbedded,

    /// The service has been destroyed and no longer sends messages.
    #[error("Message service destroyed")]
    ServiceDestroyed,

    // ========================================================================
    // Wire Format Errors
    // ========================================================================
    /// JSON serialization or parse error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Inbound value lacks a recognizable message `type`.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the structural problem.
        message: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Operation timeout.
    ///
    /// Returned when the transport does not confirm a send in time.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// A pending operation was interrupted by service teardown.
    #[error("Operation cancelled by teardown")]
    Cancelled,

    // ========================================================================
    // Environment Errors
    // ========================================================================
    /// The window was closed while it was being inspected.
    #[error("Window closed")]
    WindowClosed,

    /// Listener registration failed.
    ///
    /// Listener add/remove are total operations; this variant is reserved
    /// for embedders whose environment can refuse a registration.
    #[error("Listener registration failed: {message}")]
    ListenerRegistration {
        /// Description of the registration failure.
        message: String,
    },
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a transport unavailable error.
    #[inline]
    pub fn transport_unavailable(entry_point: impl Into<String>) -> Self {
        Self::TransportUnavailable {
            entry_point: entry_point.into(),
        }
    }

    /// Creates a native call error.
    #[inline]
    pub fn native_call(message: impl Into<String>) -> Self {
        Self::NativeCall {
            message: message.into(),
        }
    }

    /// Creates a storage error.
    #[inline]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    #[inline]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if the failure happened at the transport level.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::TransportUnavailable { .. } | Self::NativeCall { .. } | Self::Storage { .. }
        )
    }

    /// Returns `true` if an inbound or outbound value was malformed.
    #[inline]
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Json(_))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::transport_unavailable("Android.postMessage");
        assert_eq!(
            err.to_string(),
            "Transport unavailable: Android.postMessage is not callable"
        );
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("send timeout must be greater than zero");
        assert_eq!(
            err.to_string(),
            "Configuration error: send timeout must be greater than zero"
        );
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::timeout("send PING", 5000);
        let other_err = Error::native_call("boom");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
        assert_eq!(timeout_err.to_string(), "Timeout after 5000ms: send PING");
    }

    #[test]
    fn test_is_transport_error() {
        assert!(Error::transport_unavailable("webkit").is_transport_error());
        assert!(Error::native_call("boom").is_transport_error());
        assert!(Error::storage("quota exceeded").is_transport_error());
        assert!(!Error::timeout("send", 1).is_transport_error());
        assert!(!Error::NotEmbedded.is_transport_error());
    }

    #[test]
    fn test_is_validation_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        assert!(Error::from(json_err).is_validation_error());
        assert!(Error::validation("missing type").is_validation_error());
        assert!(!Error::Cancelled.is_validation_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
