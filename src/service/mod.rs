//! Message service.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | Timeout, send policy and channel tunables |
//! | `message_service` | Send, subscribe and teardown |
//! | `subscription` | Type-filtered inbound subscriptions |

// ============================================================================
// Submodules
// ============================================================================

/// Service configuration.
pub mod config;

/// The message service.
pub mod message_service;

/// Inbound subscriptions.
pub mod subscription;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_SEND_TIMEOUT, MessageServiceConfig, SendPolicy};
pub use message_service::{MessageService, ServiceState};
pub use subscription::MessageSubscription;
