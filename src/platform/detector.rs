//! Platform detection.
//!
//! Answers "is there a callable native messaging entry point reachable from
//! this document, and which one?" by probing the [`Window`].
//!
//! # Probe Order
//!
//! 1. `webkit.messageHandlers.postMessageHandler` (iOS)
//! 2. `Android.postMessage` (Android)
//!
//! An entry point counts only if it is callable. Probe failures are treated
//! as [`Platform::Browser`], never as a native host.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::environment::{HostEntryPoint, Window};
use crate::error::Result;

use super::user_agent::UserAgentHints;

// ============================================================================
// Platform
// ============================================================================

/// Detection verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Embedded in an iOS `WKWebView`.
    IosWebView,
    /// Embedded in an Android `WebView`.
    AndroidWebView,
    /// Ordinary browser context, no native host.
    Browser,
}

impl Platform {
    /// Returns `true` for native WebView hosts.
    #[inline]
    #[must_use]
    pub fn is_embedded(self) -> bool {
        !matches!(self, Self::Browser)
    }

    /// Returns the verdict name.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IosWebView => "ios-webview",
            Self::AndroidWebView => "android-webview",
            Self::Browser => "browser",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PlatformDetector
// ============================================================================

/// Probes a window for native host entry points.
///
/// The first verdict is cached until [`PlatformDetector::reset_cache`].
#[derive(Debug)]
pub struct PlatformDetector {
    /// Inspected window.
    window: Window,
    /// Cached verdict.
    cache: Mutex<Option<Platform>>,
}

impl PlatformDetector {
    /// Creates a detector for `window`.
    #[inline]
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self {
            window,
            cache: Mutex::new(None),
        }
    }

    /// Returns the inspected window.
    #[inline]
    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Returns the verdict, probing the window on first use.
    pub fn detect(&self) -> Platform {
        let mut cache = self.cache.lock();
        if let Some(platform) = *cache {
            return platform;
        }

        let platform = match self.probe() {
            Ok(platform) => platform,
            Err(e) => {
                warn!(error = %e, "Platform probe failed, assuming browser");
                Platform::Browser
            }
        };

        *cache = Some(platform);
        platform
    }

    /// Returns the cached verdict without probing.
    #[inline]
    #[must_use]
    pub fn cached(&self) -> Option<Platform> {
        *self.cache.lock()
    }

    /// Discards the cached verdict; the next [`detect`](Self::detect) probes again.
    pub fn reset_cache(&self) {
        *self.cache.lock() = None;
    }

    /// Returns `true` if a native WebView host is present.
    #[inline]
    #[must_use]
    pub fn is_embedded_webview(&self) -> bool {
        self.detect().is_embedded()
    }

    /// Returns `true` if the iOS host is selected.
    #[inline]
    #[must_use]
    pub fn is_ios_webview(&self) -> bool {
        self.detect() == Platform::IosWebView
    }

    /// Returns `true` if the Android host is selected.
    #[inline]
    #[must_use]
    pub fn is_android_webview(&self) -> bool {
        self.detect() == Platform::AndroidWebView
    }

    /// Returns user-agent hints for the window, if it has a user agent.
    #[must_use]
    pub fn user_agent_hints(&self) -> Option<UserAgentHints> {
        let user_agent = self.window.user_agent()?;
        Some(UserAgentHints::parse(&user_agent, self.window.is_standalone()))
    }

    fn probe(&self) -> Result<Platform> {
        let has_ios_bridge = is_callable(self.window.ios_message_handler()?);
        let has_android_bridge = is_callable(self.window.android_interface()?);

        let platform = match (has_ios_bridge, has_android_bridge) {
            (true, true) => match self.user_agent_hints() {
                Some(hints) if hints.is_android_webview() => Platform::AndroidWebView,
                _ => Platform::IosWebView,
            },
            (true, false) => Platform::IosWebView,
            (false, true) => Platform::AndroidWebView,
            (false, false) => Platform::Browser,
        };

        debug!(
            has_ios_bridge,
            has_android_bridge,
            platform = %platform,
            "WebView detection"
        );

        Ok(platform)
    }
}

fn is_callable(entry: Option<HostEntryPoint>) -> bool {
    entry.is_some_and(|entry| entry.is_callable())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn callable() -> HostEntryPoint {
        HostEntryPoint::from_fn(|_| Ok(()))
    }

    #[test]
    fn test_plain_window_is_browser() {
        let detector = PlatformDetector::new(Window::new());
        assert_eq!(detector.detect(), Platform::Browser);
        assert!(!detector.is_embedded_webview());
    }

    #[test]
    fn test_detects_ios_bridge() {
        let window = Window::builder().ios_handler(callable()).build();
        let detector = PlatformDetector::new(window);

        assert_eq!(detector.detect(), Platform::IosWebView);
        assert!(detector.is_ios_webview());
        assert!(detector.is_embedded_webview());
    }

    #[test]
    fn test_detects_android_bridge() {
        let window = Window::builder().android_interface(callable()).build();
        let detector = PlatformDetector::new(window);

        assert_eq!(detector.detect(), Platform::AndroidWebView);
        assert!(detector.is_android_webview());
    }

    #[test]
    fn test_uncallable_entry_points_are_absent() {
        let window = Window::builder()
            .ios_handler(HostEntryPoint::Uncallable(json!("not a function")))
            .android_interface(HostEntryPoint::Uncallable(json!({})))
            .build();

        assert_eq!(PlatformDetector::new(window).detect(), Platform::Browser);
    }

    #[test]
    fn test_ios_wins_when_both_present() {
        let window = Window::builder()
            .ios_handler(callable())
            .android_interface(callable())
            .build();

        assert_eq!(PlatformDetector::new(window).detect(), Platform::IosWebView);
    }

    #[test]
    fn test_user_agent_breaks_tie_for_android() {
        let window = Window::builder()
            .ios_handler(callable())
            .android_interface(callable())
            .user_agent("Mozilla/5.0 (Linux; Android 14; Pixel 8 Build/UQ1A; wv) Chrome/124.0")
            .build();

        assert_eq!(
            PlatformDetector::new(window).detect(),
            Platform::AndroidWebView
        );
    }

    #[test]
    fn test_user_agent_alone_never_claims_native() {
        let window = Window::builder()
            .user_agent("Mozilla/5.0 (Linux; Android 14; Pixel 8 Build/UQ1A; wv) Chrome/124.0")
            .build();
        let detector = PlatformDetector::new(window);

        assert!(detector.user_agent_hints().expect("hints").is_android_webview());
        assert_eq!(detector.detect(), Platform::Browser);
    }

    #[test]
    fn test_verdict_is_cached_until_reset() {
        let window = Window::new();
        let detector = PlatformDetector::new(window.clone());

        assert_eq!(detector.cached(), None);
        assert_eq!(detector.detect(), Platform::Browser);
        assert_eq!(detector.cached(), Some(Platform::Browser));

        window.set_android_interface(Some(callable()));
        assert_eq!(detector.detect(), Platform::Browser);

        detector.reset_cache();
        assert_eq!(detector.cached(), None);
        assert_eq!(detector.detect(), Platform::AndroidWebView);
    }

    #[test]
    fn test_probe_failure_falls_back_to_browser() {
        let window = Window::builder().ios_handler(callable()).build();
        window.close();

        let detector = PlatformDetector::new(window);
        assert_eq!(detector.detect(), Platform::Browser);
        assert_eq!(detector.cached(), Some(Platform::Browser));
    }

    #[test]
    fn test_platform_display() {
        assert_eq!(Platform::IosWebView.to_string(), "ios-webview");
        assert_eq!(Platform::AndroidWebView.to_string(), "android-webview");
        assert_eq!(Platform::Browser.to_string(), "browser");
    }
}
