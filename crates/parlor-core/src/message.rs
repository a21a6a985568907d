//! Chat messages as kept in the shared, append-only message list.
//!
//! A [`Message`] is immutable once constructed. The store identifies each
//! message by an opaque [`MessageKey`] it assigns on push; the client never
//! invents keys.
//!
//! The serialized field names (`email`, `message`, `time`) are the wire shape
//! of the remote store and must not change.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque key assigned by the backend store to a pushed message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageKey(String);

impl MessageKey {
    /// Wrap a store-assigned key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "email")]
    author_email: String,
    #[serde(rename = "message")]
    body: String,
    #[serde(rename = "time")]
    sent_at: DateTime<Utc>,
}

impl Message {
    /// Create a message.
    pub fn new(
        author_email: impl Into<String>,
        body: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self { author_email: author_email.into(), body: body.into(), sent_at }
    }

    /// Email of the user who sent the message.
    pub fn author_email(&self) -> &str {
        &self.author_email
    }

    /// Message text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// When the sender submitted the message.
    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }
}

/// A message paired with the key the store assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    /// Store-assigned key.
    pub key: MessageKey,
    /// The message itself.
    pub message: Message,
}

impl StoredMessage {
    /// Pair a key with a message.
    pub fn new(key: impl Into<MessageKey>, message: Message) -> Self {
        Self { key: key.into(), message }
    }
}

impl From<String> for MessageKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn decodes_store_wire_shape() {
        let json = r#"{"email":"bob@x.co","message":"hi","time":"2019-03-01T10:20:30.000Z"}"#;
        let message: Message = serde_json::from_str(json).unwrap();

        assert_eq!(message.author_email(), "bob@x.co");
        assert_eq!(message.body(), "hi");
        assert_eq!(message.sent_at(), Utc.with_ymd_and_hms(2019, 3, 1, 10, 20, 30).unwrap());
    }

    #[test]
    fn encodes_store_field_names() {
        let at = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        let value = serde_json::to_value(Message::new("a@b.cd", "yo", at)).unwrap();

        assert_eq!(value["email"], "a@b.cd");
        assert_eq!(value["message"], "yo");
        assert!(value["time"].as_str().is_some_and(|t| t.starts_with("2020-01-02T03:04:05")));
    }

    #[test]
    fn keys_order_lexicographically() {
        let mut keys = vec![MessageKey::from("b"), MessageKey::from("a"), MessageKey::from("c")];
        keys.sort();
        assert_eq!(keys.iter().map(MessageKey::as_str).collect::<Vec<_>>(), ["a", "b", "c"]);
    }
}
