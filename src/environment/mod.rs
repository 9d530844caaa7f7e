//! Hosting environment seen by the document.
//!
//! The bridge never talks to a platform directly; it inspects and drives the
//! environment the document runs in. This module models that environment:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  Window (tab)                            │
//! │    webkit.messageHandlers.postMessage    │──► iOS shell
//! │    Android.postMessage                   │──► Android shell
//! │    message events (same window)          │◄── shell replies
//! │    localStorage ─────────────────────────┼──► sibling tabs
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `host` | Native entry points |
//! | `storage` | Origin-scoped storage with change events |
//! | `window` | Window handle and builder |

// ============================================================================
// Submodules
// ============================================================================

/// Native host entry points.
pub mod host;

/// Shared storage with cross-window notifications.
pub mod storage;

/// Window handle and builder.
pub mod window;

// ============================================================================
// Re-exports
// ============================================================================

pub use host::{HostEntryPoint, NativeHandler};
pub use storage::{SharedStorage, StorageEvent};
pub use window::{ANY_ORIGIN, DEFAULT_ORIGIN, Window, WindowBuilder, WindowMessage};
