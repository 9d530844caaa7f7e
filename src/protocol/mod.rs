//! Wire protocol message types.
//!
//! This module defines the message format exchanged between the web
//! document and its host.
//!
//! # Protocol Overview
//!
//! Every message is a flat JSON object, no framing and no envelope:
//!
//! ```json
//! {
//!   "type": "PING",
//!   "payload": { "n": 1 },
//!   "timestamp": 1735689600000,
//!   "source": "webview",
//!   "token": "optional"
//! }
//! ```
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | [`Message`] | both | Typed message value |
//! | [`RawMessage`] | Transport → Service | Unvalidated inbound value |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | `Message` and `Source` |
//! | `inbound` | `RawMessage` parsing and validation |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound raw values and their validation.
pub mod inbound;

/// Message and source types.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use inbound::{RawMessage, UNKNOWN_MESSAGE_TYPE};
pub use message::{Message, Source, now_millis};
