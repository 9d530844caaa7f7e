//! WebView Bridge - Platform-adaptive messaging between a web document and
//! its native host.
//!
//! A document embedded in an iOS `WKWebView`, an Android `WebView`, or
//! running in a plain browser tab exchanges typed, asynchronous messages
//! with its counterpart without knowing which host it runs in.
//!
//! # Architecture
//!
//! ```text
//! Window ─► PlatformDetector ─► BridgeFactory ─► Bridge::{Ios, Android, Browser}
//!                                                    ▲
//!                                     MessageService ┘ send / on_message / destroy
//! ```
//!
//! Key design principles:
//!
//! - Detection runs once and is cached explicitly (`reset_cache` to re-probe)
//! - Transports are a closed enum selected once at construction
//! - Each bridge owns one tokio event loop for inbound events
//! - `source` tags prevent a side from receiving its own messages
//!
//! # Quick Start
//!
//! ```no_run
//! use serde_json::json;
//! use webview_bridge::{HostEntryPoint, MessageService, MessageServiceConfig, Result, Window};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // The Android shell injects its JavaScript interface
//!     let window = Window::builder()
//!         .android_interface(HostEntryPoint::from_fn(|json| {
//!             println!("host received {json}");
//!             Ok(())
//!         }))
//!         .build();
//!
//!     let service = MessageService::for_window(&window, MessageServiceConfig::new())?;
//!     let mut replies = service.on_message(Some("RECEIVED"));
//!
//!     service.send("PING", Some(json!({"n": 1}))).await?;
//!
//!     if let Some(reply) = replies.recv().await {
//!         println!("reply: {:?}", reply.payload);
//!     }
//!
//!     service.destroy();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`environment`] | Window, host entry points, shared storage |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`logging`] | Opt-in log capture layer |
//! | [`platform`] | Platform detection |
//! | [`protocol`] | Wire message types |
//! | [`service`] | Message service |
//! | [`transport`] | iOS, Android and browser bridges |

// ============================================================================
// Modules
// ============================================================================

/// Hosting environment: window, entry points, storage.
///
/// - [`Window`] - Browsing window handle
/// - [`HostEntryPoint`] - Native entry point as the document sees it
/// - [`SharedStorage`] - Origin-scoped storage with change events
pub mod environment;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Log capture for in-document display.
pub mod logging;

/// Platform detection.
pub mod platform;

/// Wire message types.
pub mod protocol;

/// Publish/subscribe message service.
pub mod service;

/// Message transports.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Environment types
pub use environment::{HostEntryPoint, NativeHandler, SharedStorage, Window, WindowBuilder};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::WindowId;

// Logging types
pub use logging::{LogCapture, LogEntry, LogLevel};

// Platform types
pub use platform::{Platform, PlatformDetector};

// Protocol types
pub use protocol::{Message, RawMessage, Source};

// Service types
pub use service::{MessageService, MessageServiceConfig, MessageSubscription, SendPolicy, ServiceState};

// Transport types
pub use transport::{Bridge, BridgeFactory, Listener};
