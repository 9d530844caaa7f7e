//! Message and source types.
//!
//! [`Message`] is the unit of communication. It is built fresh for every
//! send or receipt and never mutated afterwards.

// ============================================================================
// Imports
// ============================================================================

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Source
// ============================================================================

/// Which side produced a message.
///
/// Used exclusively for loop prevention, never for authorization. Tags this
/// crate does not know are kept verbatim in [`Source::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    /// The web document (this side).
    Webview,
    /// Another browser tab or window.
    Browser,
    /// A native host, platform unspecified.
    Native,
    /// The iOS host.
    Ios,
    /// The Android host.
    Android,
    /// Any other tag, as received.
    Other(String),
}

impl Source {
    /// Returns `true` for tags that only a native host stamps.
    #[inline]
    #[must_use]
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native | Self::Ios | Self::Android)
    }

    /// Returns the wire representation.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Webview => "webview",
            Self::Browser => "browser",
            Self::Native => "native",
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for Source {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "webview" => Self::Webview,
            "browser" => Self::Browser,
            "native" => Self::Native,
            "ios" => Self::Ios,
            "android" => Self::Android,
            _ => Self::Other(tag),
        }
    }
}

impl From<Source> for String {
    fn from(source: Source) -> Self {
        match source {
            Source::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

// ============================================================================
// Message
// ============================================================================

/// A typed message exchanged between document and host.
///
/// # Format
///
/// ```json
/// {
///   "type": "PING",
///   "payload": { "n": 1 },
///   "timestamp": 1735689600000,
///   "source": "webview"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Discriminates handling. Never empty on a delivered message.
    #[serde(rename = "type")]
    pub message_type: String,

    /// Arbitrary JSON payload. An explicit `null` is kept as `Some(Null)`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub payload: Option<Value>,

    /// Milliseconds since epoch, stamped by the sender.
    ///
    /// Fractional values are truncated; negative or non-numeric values read
    /// as `None`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_timestamp"
    )]
    pub timestamp: Option<u64>,

    /// Producing side. A non-string tag reads as `None`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_source"
    )]
    pub source: Option<Source>,

    /// Reserved correlation field, not interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Message {
    /// Creates a message with only a type and payload.
    #[inline]
    #[must_use]
    pub fn new(message_type: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            message_type: message_type.into(),
            payload,
            timestamp: None,
            source: None,
            token: None,
        }
    }

    /// Creates an outgoing message stamped with the current time and `source`.
    #[must_use]
    pub fn outgoing(message_type: impl Into<String>, payload: Option<Value>, source: Source) -> Self {
        Self {
            timestamp: Some(now_millis()),
            source: Some(source),
            ..Self::new(message_type, payload)
        }
    }

    /// Sets the source tag.
    #[inline]
    #[must_use]
    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the timestamp.
    #[inline]
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the reserved token.
    #[inline]
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Returns `true` if this message type equals `message_type`.
    #[inline]
    #[must_use]
    pub fn is(&self, message_type: &str) -> bool {
        self.message_type == message_type
    }

    /// Serializes to the wire format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a message from the wire format.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the text is not JSON
    /// - [`Error::Validation`] if the value has no usable `type`
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Converts a structured value into a message after validating `type`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the value is not an object or its
    /// `type` field is missing, empty, or not a string.
    pub fn from_value(value: Value) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(Error::validation("message must be a JSON object"));
        };

        match object.get("type").and_then(Value::as_str) {
            Some(t) if !t.is_empty() => {}
            Some(_) => return Err(Error::validation("message type is empty")),
            None => return Err(Error::validation("message has no string `type` field")),
        }

        serde_json::from_value(value).map_err(|e| Error::validation(e.to_string()))
    }

    /// Gets a string value from the payload object.
    ///
    /// Returns `None` if the payload is not an object or the key is missing.
    #[inline]
    #[must_use]
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.as_ref()?.get(key)?.as_str()
    }
}

/// Deserializes a field that is present, keeping JSON `null` as `Some(Null)`.
fn deserialize_present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Reads a millisecond timestamp from any JSON number.
///
/// iOS hosts stamp `Date().timeIntervalSince1970 * 1000`, a float.
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if let Some(millis) = value.as_u64() {
        return Ok(Some(millis));
    }

    Ok(value
        .as_f64()
        .filter(|millis| millis.is_finite() && *millis >= 0.0 && *millis < u64::MAX as f64)
        .map(|millis| millis as u64))
}

fn deserialize_source<'de, D>(deserializer: D) -> std::result::Result<Option<Source>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(tag) => Ok(Some(Source::from(tag))),
        _ => Ok(None),
    }
}

// ============================================================================
// Time
// ============================================================================

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_message_serialization_skips_absent_fields() {
        let message = Message::new("PING", Some(json!({"n": 1})));
        let json = message.to_json().expect("serialize");

        assert_eq!(json, r#"{"type":"PING","payload":{"n":1}}"#);
    }

    #[test]
    fn test_outgoing_stamps_time_and_source() {
        let before = now_millis();
        let message = Message::outgoing("PING", None, Source::Webview);

        assert_eq!(message.source, Some(Source::Webview));
        assert!(message.timestamp.expect("timestamp") >= before);
        assert!(message.to_json().expect("serialize").contains(r#""source":"webview""#));
    }

    #[test]
    fn test_from_json_host_message() {
        let text = r#"{
            "type": "RECEIVED",
            "payload": {"originalType": "TEST_MESSAGE"},
            "source": "android",
            "timestamp": 1735689600000
        }"#;

        let message = Message::from_json(text).expect("parse");
        assert!(message.is("RECEIVED"));
        assert_eq!(message.source, Some(Source::Android));
        assert_eq!(message.payload_str("originalType"), Some("TEST_MESSAGE"));
        assert_eq!(message.timestamp, Some(1_735_689_600_000));
    }

    #[test]
    fn test_from_value_rejects_missing_type() {
        let err = Message::from_value(json!({"foo": 1})).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_from_value_rejects_empty_and_non_string_type() {
        assert!(Message::from_value(json!({"type": ""})).is_err());
        assert!(Message::from_value(json!({"type": 7})).is_err());
        assert!(Message::from_value(json!(["type", "PING"])).is_err());
    }

    #[test]
    fn test_unknown_source_is_kept_verbatim() {
        let message = Message::from_value(json!({"type": "X", "source": "desktop"})).expect("parse");
        assert_eq!(message.source, Some(Source::Other("desktop".to_string())));
        assert_eq!(
            message.to_json().expect("serialize"),
            r#"{"type":"X","source":"desktop"}"#
        );
    }

    #[test]
    fn test_non_string_source_is_ignored() {
        let message = Message::from_value(json!({"type": "X", "source": 7})).expect("parse");
        assert_eq!(message.source, None);
    }

    #[test]
    fn test_float_timestamp_is_truncated() {
        let message = Message::from_value(json!({
            "type": "RECEIVED",
            "source": "ios",
            "timestamp": 1_735_689_600_123.456_f64
        }))
        .expect("parse");
        assert_eq!(message.timestamp, Some(1_735_689_600_123));
    }

    #[test]
    fn test_unusable_timestamp_reads_as_none() {
        for timestamp in [json!(-5), json!(-1.5), json!(1e30), json!("yesterday"), Value::Null] {
            let message = Message::from_value(json!({"type": "X", "timestamp": timestamp}))
                .expect("parse");
            assert_eq!(message.timestamp, None);
        }
    }

    #[test]
    fn test_explicit_null_payload_is_kept() {
        let message = Message::from_json(r#"{"type":"X","payload":null}"#).expect("parse");
        assert_eq!(message.payload, Some(Value::Null));

        let message = Message::from_json(r#"{"type":"X"}"#).expect("parse");
        assert_eq!(message.payload, None);
    }

    #[test]
    fn test_source_is_native() {
        assert!(Source::Native.is_native());
        assert!(Source::Ios.is_native());
        assert!(Source::Android.is_native());
        assert!(!Source::Webview.is_native());
        assert!(!Source::Browser.is_native());
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_wire_round_trip(
            message_type in "[A-Z_]{1,16}",
            payload in proptest::option::of(arb_json()),
            timestamp in proptest::option::of(any::<u64>()),
        ) {
            let mut message = Message::new(message_type, payload);
            message.timestamp = timestamp;
            message.source = Some(Source::Webview);

            let parsed = Message::from_json(&message.to_json().unwrap()).unwrap();
            prop_assert_eq!(parsed, message);
        }
    }
}
