//! Message service configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use webview_bridge::{MessageServiceConfig, SendPolicy};
//!
//! let config = MessageServiceConfig::new()
//!     .with_send_timeout(Duration::from_secs(2))
//!     .with_send_policy(SendPolicy::RequireEmbedded)
//!     .with_plain_text_wrapping();
//!
//! config.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default time a send may take before it fails with a timeout.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Default capacity of the subscriber channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// SendPolicy
// ============================================================================

/// What `send` does when no native host is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SendPolicy {
    /// Relay through the browser bridge to other tabs.
    #[default]
    AllowBrowserRelay,
    /// Fail fast with [`Error::NotEmbedded`].
    RequireEmbedded,
}

// ============================================================================
// MessageServiceConfig
// ============================================================================

/// Tunables of a [`MessageService`](super::MessageService).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageServiceConfig {
    /// Upper bound on a single send.
    pub send_timeout: Duration,

    /// Behaviour without a native host.
    pub send_policy: SendPolicy,

    /// Wrap inbound plain text as `UNKNOWN` messages instead of dropping it.
    pub wrap_plain_text: bool,

    /// Buffered messages per subscriber before the oldest are dropped.
    pub channel_capacity: usize,
}

impl Default for MessageServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl MessageServiceConfig {
    /// Creates the default configuration.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
            send_policy: SendPolicy::AllowBrowserRelay,
            wrap_plain_text: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl MessageServiceConfig {
    /// Sets the send timeout.
    #[inline]
    #[must_use]
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Sets the send policy.
    #[inline]
    #[must_use]
    pub fn with_send_policy(mut self, policy: SendPolicy) -> Self {
        self.send_policy = policy;
        self
    }

    /// Enables wrapping of inbound plain text.
    #[inline]
    #[must_use]
    pub fn with_plain_text_wrapping(mut self) -> Self {
        self.wrap_plain_text = true;
        self
    }

    /// Sets the subscriber channel capacity.
    #[inline]
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl MessageServiceConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero timeout or zero capacity.
    pub fn validate(&self) -> Result<()> {
        if self.send_timeout.is_zero() {
            return Err(Error::config("send timeout must be greater than zero"));
        }

        if self.channel_capacity == 0 {
            return Err(Error::config("channel capacity must be greater than zero"));
        }

        Ok(())
    }

    /// Send timeout in whole milliseconds, saturating at `u64::MAX`.
    #[inline]
    #[must_use]
    pub fn send_timeout_ms(&self) -> u64 {
        u64::try_from(self.send_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MessageServiceConfig::default();
        assert_eq!(config.send_timeout, Duration::from_secs(5));
        assert_eq!(config.send_policy, SendPolicy::AllowBrowserRelay);
        assert!(!config.wrap_plain_text);
        assert_eq!(config.channel_capacity, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = MessageServiceConfig::new()
            .with_send_timeout(Duration::from_millis(250))
            .with_send_policy(SendPolicy::RequireEmbedded)
            .with_plain_text_wrapping()
            .with_channel_capacity(8);

        assert_eq!(config.send_timeout_ms(), 250);
        assert_eq!(config.send_policy, SendPolicy::RequireEmbedded);
        assert!(config.wrap_plain_text);
        assert_eq!(config.channel_capacity, 8);
    }

    #[test]
    fn test_send_timeout_ms_saturates() {
        let config = MessageServiceConfig::new().with_send_timeout(Duration::MAX);
        assert_eq!(config.send_timeout_ms(), u64::MAX);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let err = MessageServiceConfig::new()
            .with_send_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        assert!(
            MessageServiceConfig::new()
                .with_channel_capacity(0)
                .validate()
                .is_err()
        );
    }
}
