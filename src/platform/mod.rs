//! Hosting platform detection.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `detector` | Entry point probing with an explicit verdict cache |
//! | `user_agent` | User-agent heuristics used to break ties |

// ============================================================================
// Submodules
// ============================================================================

/// Entry point probing and the cached verdict.
pub mod detector;

/// User-agent heuristics.
pub mod user_agent;

// ============================================================================
// Re-exports
// ============================================================================

pub use detector::{Platform, PlatformDetector};
pub use user_agent::UserAgentHints;
