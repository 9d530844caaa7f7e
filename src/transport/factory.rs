//! Bridge selection.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::environment::Window;
use crate::platform::{Platform, PlatformDetector};

use super::{AndroidBridge, Bridge, BrowserBridge, IosBridge};

// ============================================================================
// BridgeFactory
// ============================================================================

/// Picks the transport matching the detector verdict.
///
/// | Verdict | Bridge |
/// |---------|--------|
/// | `IosWebView` | [`Bridge::Ios`] |
/// | `AndroidWebView` | [`Bridge::Android`] |
/// | `Browser` | [`Bridge::Browser`] |
#[derive(Debug)]
pub struct BridgeFactory {
    detector: PlatformDetector,
}

impl BridgeFactory {
    /// Creates a factory using `detector`.
    #[inline]
    #[must_use]
    pub fn new(detector: PlatformDetector) -> Self {
        Self { detector }
    }

    /// Creates a factory with a fresh detector for `window`.
    #[inline]
    #[must_use]
    pub fn for_window(window: Window) -> Self {
        Self::new(PlatformDetector::new(window))
    }

    /// Returns the detector.
    #[inline]
    #[must_use]
    pub fn detector(&self) -> &PlatformDetector {
        &self.detector
    }

    /// Builds the bridge for the current verdict.
    ///
    /// Never fails; detection errors already resolve to the browser bridge.
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn create_bridge(&self) -> Bridge {
        let platform = self.detector.detect();
        let window = self.detector.window().clone();

        debug!(%platform, "Creating bridge");

        match platform {
            Platform::IosWebView => Bridge::Ios(IosBridge::new(window)),
            Platform::AndroidWebView => Bridge::Android(AndroidBridge::new(window)),
            Platform::Browser => Bridge::Browser(BrowserBridge::new(window)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::environment::HostEntryPoint;

    fn callable() -> HostEntryPoint {
        HostEntryPoint::from_fn(|_| Ok(()))
    }

    #[tokio::test]
    async fn test_creates_ios_bridge() {
        let window = Window::builder().ios_handler(callable()).build();
        let bridge = BridgeFactory::for_window(window).create_bridge();

        assert!(matches!(bridge, Bridge::Ios(_)));
        assert_eq!(bridge.platform(), Platform::IosWebView);
        assert!(bridge.is_native());
    }

    #[tokio::test]
    async fn test_creates_android_bridge() {
        let window = Window::builder().android_interface(callable()).build();
        let bridge = BridgeFactory::for_window(window).create_bridge();

        assert!(matches!(bridge, Bridge::Android(_)));
        assert!(bridge.is_native());
    }

    #[tokio::test]
    async fn test_ios_preferred_when_both_present() {
        let window = Window::builder()
            .ios_handler(callable())
            .android_interface(callable())
            .build();

        let bridge = BridgeFactory::for_window(window).create_bridge();
        assert!(matches!(bridge, Bridge::Ios(_)));
    }

    #[tokio::test]
    async fn test_falls_back_to_browser() {
        let bridge = BridgeFactory::for_window(Window::new()).create_bridge();

        assert!(matches!(bridge, Bridge::Browser(_)));
        assert!(!bridge.is_native());
    }

    #[tokio::test]
    async fn test_detection_failure_yields_browser() {
        let window = Window::builder().android_interface(callable()).build();
        window.close();

        let bridge = BridgeFactory::for_window(window).create_bridge();
        assert_eq!(bridge.platform(), Platform::Browser);
    }

    #[tokio::test]
    async fn test_selection_follows_cached_verdict() {
        let window = Window::new();
        let factory = BridgeFactory::for_window(window.clone());
        assert!(matches!(factory.create_bridge(), Bridge::Browser(_)));

        window.set_ios_message_handler(Some(callable()));
        assert!(matches!(factory.create_bridge(), Bridge::Browser(_)));

        factory.detector().reset_cache();
        assert!(matches!(factory.create_bridge(), Bridge::Ios(_)));
    }
}
