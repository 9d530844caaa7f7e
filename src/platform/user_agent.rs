//! User-agent heuristics.
//!
//! Best-effort hints about the embedding shell, derived from the user-agent
//! string. Used only to break ties between callable entry points, never to
//! claim a native host on their own.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;

// ============================================================================
// Patterns
// ============================================================================

static IOS_DEVICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"iPad|iPhone|iPod").expect("valid iOS device pattern"));

static ANDROID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Android").expect("valid Android pattern"));

// Android System WebView adds a `wv` token: "(Linux; Android 14; Pixel 8 Build/...; wv)".
static ANDROID_WEBVIEW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:;\s*wv\)|\bwebview\b)").expect("valid Android WebView pattern")
});

// ============================================================================
// UserAgentHints
// ============================================================================

/// Platform hints parsed from a user-agent string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserAgentHints {
    /// The device is an iPad, iPhone or iPod.
    pub is_ios: bool,
    /// The device runs Android.
    pub is_android: bool,
    /// The document appears to run inside an app's WebView.
    pub is_webview: bool,
}

impl UserAgentHints {
    /// Parses hints from `user_agent`.
    ///
    /// `standalone` is the iOS home-screen flag; a standalone web app is a
    /// browser context, not a WebView.
    #[must_use]
    pub fn parse(user_agent: &str, standalone: bool) -> Self {
        let is_ios = IOS_DEVICE.is_match(user_agent);
        let is_android = ANDROID.is_match(user_agent);
        let lower = user_agent.to_lowercase();

        let is_webview = if is_ios {
            !standalone && !lower.contains("safari")
        } else if is_android {
            ANDROID_WEBVIEW.is_match(user_agent)
        } else {
            false
        };

        Self {
            is_ios,
            is_android,
            is_webview,
        }
    }

    /// Returns `true` if the string looks like an Android WebView.
    #[inline]
    #[must_use]
    pub fn is_android_webview(&self) -> bool {
        self.is_android && self.is_webview && !self.is_ios
    }

    /// Returns `true` if the string looks like an iOS WebView.
    #[inline]
    #[must_use]
    pub fn is_ios_webview(&self) -> bool {
        self.is_ios && self.is_webview
    }
}

// ============================================================================
// Tests
// ============================================================================
