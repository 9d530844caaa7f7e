//! Inbound raw values and their validation.
//!
//! Transports hand their listeners a [`RawMessage`]: whatever arrived on the
//! underlying channel, before any validation. The message service turns it
//! into a [`Message`] with [`RawMessage::into_message`].

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::error::{Error, Result};

use super::message::{Message, Source, now_millis};

// ============================================================================
// Constants
// ============================================================================

/// Type assigned to plain-text payloads when wrapping is enabled.
pub const UNKNOWN_MESSAGE_TYPE: &str = "UNKNOWN";

// ============================================================================
// RawMessage
// ============================================================================

/// An unvalidated inbound value.
#[derive(Debug, Clone, PartialEq)]
pub enum RawMessage {
    /// Text as received, usually a serialized message.
    Text(String),
    /// An already structured value.
    Json(Value),
}

impl From<Value> for RawMessage {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            other => Self::Json(other),
        }
    }
}

impl From<String> for RawMessage {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawMessage {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl RawMessage {
    /// Returns the value as a JSON object, parsing text when it looks like JSON.
    ///
    /// Returns `None` for plain text, malformed JSON, and non-object values.
    #[must_use]
    pub fn to_object(&self) -> Option<serde_json::Map<String, Value>> {
        match self {
            Self::Json(Value::Object(map)) => Some(map.clone()),
            Self::Json(_) => None,
            Self::Text(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            },
        }
    }

    /// Reads the `source` tag without validating the rest of the value.
    #[must_use]
    pub fn source(&self) -> Option<Source> {
        let source = match self {
            Self::Json(value) => value.get("source")?.clone(),
            Self::Text(_) => self.to_object()?.remove("source")?,
        };
        serde_json::from_value(source).ok()
    }

    /// Validates and converts into a [`Message`].
    ///
    /// Text starting with `{` or `[` is parsed as JSON. Other text is
    /// rejected, or wrapped as an [`UNKNOWN_MESSAGE_TYPE`] message carrying
    /// the text as payload when `wrap_plain_text` is set.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if JSON-looking text does not parse
    /// - [`Error::Validation`] if the value has no non-empty `type`
    pub fn into_message(self, wrap_plain_text: bool) -> Result<Message> {
        match self {
            Self::Json(value) => Message::from_value(value),
            Self::Text(text) => {
                let trimmed = text.trim_start();
                if trimmed.starts_with('{') || trimmed.starts_with('[') {
                    return Message::from_json(trimmed);
                }

                if wrap_plain_text {
                    return Ok(Message::new(UNKNOWN_MESSAGE_TYPE, Some(Value::String(text)))
                        .with_timestamp(now_millis()));
                }

                Err(Error::validation("plain text carries no message type"))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
