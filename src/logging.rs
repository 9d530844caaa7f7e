//! Opt-in log capture.
//!
//! [`LogCapture`] is a `tracing_subscriber` layer that republishes `INFO`,
//! `WARN` and `ERROR` records as [`LogEntry`] values, for display inside the
//! document (a debug console, a status panel). It never replaces the
//! caller's own subscriber; compose it in:
//!
//! ```ignore
//! use tracing_subscriber::layer::SubscriberExt;
//! use tracing_subscriber::util::SubscriberInitExt;
//! use webview_bridge::LogCapture;
//!
//! let capture = LogCapture::new();
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(capture.clone())
//!     .init();
//!
//! let mut live = capture.subscribe();
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::protocol::now_millis;

// ============================================================================
// Constants
// ============================================================================

/// Entries kept in history before the oldest are evicted.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

const LIVE_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// LogLevel
// ============================================================================

/// Severity of a captured entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Maps a tracing level; `DEBUG` and `TRACE` are not captured.
    #[must_use]
    pub fn from_tracing(level: &Level) -> Option<Self> {
        match *level {
            Level::ERROR => Some(Self::Error),
            Level::WARN => Some(Self::Warning),
            Level::INFO => Some(Self::Info),
            _ => None,
        }
    }

    /// Display icon.
    #[inline]
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Info => "ℹ️",
            Self::Warning => "⚠️",
            Self::Error => "❌",
        }
    }
}

// ============================================================================
// LogEntry
// ============================================================================

/// One captured log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub icon: String,
    pub message: String,
    /// Milliseconds since epoch.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
}

impl LogEntry {
    /// Creates an entry stamped now, with the level's icon.
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            icon: level.icon().to_string(),
            message: message.into(),
            timestamp_ms: now_millis(),
        }
    }
}

// ============================================================================
// LogCapture
// ============================================================================

/// Bounded in-memory log history with a live feed.
///
/// Cloning is cheap; clones share history and feed.
#[derive(Clone)]
pub struct LogCapture {
    inner: Arc<CaptureInner>,
}

struct CaptureInner {
    history: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
    live: broadcast::Sender<LogEntry>,
}

impl fmt::Debug for LogCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogCapture")
            .field("len", &self.len())
            .field("capacity", &self.inner.capacity)
            .finish()
    }
}

impl Default for LogCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl LogCapture {
    /// Creates a capture keeping [`DEFAULT_HISTORY_CAPACITY`] entries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates a capture keeping at most `capacity` entries (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(CaptureInner {
                history: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY))),
                capacity,
                live,
            }),
        }
    }

    /// Snapshot of the history, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.inner.history.lock().iter().cloned().collect()
    }

    /// Number of entries in history.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.history.lock().len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.history.lock().is_empty()
    }

    /// Subscribes to entries recorded from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.inner.live.subscribe()
    }

    /// Empties the history, then records a "Logs cleared" entry.
    pub fn clear(&self) {
        self.inner.history.lock().clear();
        self.record(LogEntry {
            icon: "✨".to_string(),
            ..LogEntry::new(LogLevel::Info, "Logs cleared")
        });
    }

    /// Appends `entry`, evicting the oldest beyond capacity.
    pub fn record(&self, entry: LogEntry) {
        {
            let mut history = self.inner.history.lock();
            if history.len() == self.inner.capacity {
                history.pop_front();
            }
            history.push_back(entry.clone());
        }
        let _ = self.inner.live.send(entry);
    }
}

impl<S> Layer<S> for LogCapture
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let Some(level) = LogLevel::from_tracing(event.metadata().level()) else {
            return;
        };

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.record(LogEntry::new(level, visitor.finish()));
    }
}

// ============================================================================
// MessageVisitor
// ============================================================================

/// Flattens an event into `message key=value ...`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.record_debug(field, &value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
            return;
        }
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={value:?}", field.name());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tracing::{debug, error, info, warn};
    use tracing_subscriber::layer::SubscriberExt;

    fn capture_with<F: FnOnce()>(capture: &LogCapture, f: F) {
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        tracing::subscriber::with_default(subscriber, f);
    }

    #[test]
    fn test_captures_info_warning_error() {
        let capture = LogCapture::new();
        capture_with(&capture, || {
            info!("Message sent");
            warn!(skipped = 3, "Subscriber lagged");
            error!("Failed to parse message from storage");
            debug!("not captured");
        });

        let entries = capture.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[0].message, "Message sent");
        assert_eq!(entries[1].level, LogLevel::Warning);
        assert_eq!(entries[1].message, "Subscriber lagged skipped=3");
        assert_eq!(entries[2].icon, "❌");
    }

    #[test]
    fn test_history_is_bounded() {
        let capture = LogCapture::with_capacity(3);
        for n in 0..5 {
            capture.record(LogEntry::new(LogLevel::Info, format!("entry {n}")));
        }

        let messages: Vec<String> = capture.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, ["entry 2", "entry 3", "entry 4"]);
    }

    #[test]
    fn test_default_capacity() {
        let capture = LogCapture::new();
        for n in 0..(DEFAULT_HISTORY_CAPACITY + 10) {
            capture.record(LogEntry::new(LogLevel::Info, n.to_string()));
        }
        assert_eq!(capture.len(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(capture.entries()[0].message, "10");
    }

    #[test]
    fn test_clear_leaves_marker() {
        let capture = LogCapture::new();
        capture.record(LogEntry::new(LogLevel::Error, "boom"));
        capture.clear();

        let entries = capture.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Logs cleared");
        assert_eq!(entries[0].icon, "✨");
        assert_eq!(entries[0].level, LogLevel::Info);
    }

    #[test]
    fn test_live_feed() {
        let capture = LogCapture::new();
        let mut live = capture.subscribe();
        capture_with(&capture, || warn!("careful"));

        let entry = live.try_recv().expect("live entry");
        assert_eq!(entry.level, LogLevel::Warning);
        assert_eq!(entry.message, "careful");
    }

    #[test]
    fn test_entry_serializes_like_log_message() {
        let entry = LogEntry {
            level: LogLevel::Warning,
            icon: "⚠️".to_string(),
            message: "x".to_string(),
            timestamp_ms: 1,
        };
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"level": "warning", "icon": "⚠️", "message": "x", "timestamp": 1})
        );
    }
}
