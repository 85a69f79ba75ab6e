// ABOUTME: Chat message type and frame construction
// ABOUTME: Builds handshake and chat frames, decodes typed envelopes

use crate::error::Error;
use crate::protocol::classify;
use crate::protocol::keys::{self, MessageType};
use serde_json::{Map, Value};

/// Username and password sent once during the handshake
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account name, kept by the session after login
    pub username: String,
    /// Sent in plain text; the protocol has no other scheme
    pub password: String,
}

impl Credentials {
    /// Credentials for `username`
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A chat message; `dst` of `None` is a broadcast to all users
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatMessage {
    /// Sender username
    pub src: String,
    /// Recipient username, `None` for everyone
    pub dst: Option<String>,
    /// Message text
    pub msg: String,
}

impl ChatMessage {
    /// Message addressed to everyone
    pub fn group(src: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: None,
            msg: msg.into(),
        }
    }

    /// Message addressed to a single user
    pub fn direct(src: impl Into<String>, dst: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: Some(dst.into()),
            msg: msg.into(),
        }
    }

    /// Whether the message has no single recipient
    pub fn is_broadcast(&self) -> bool {
        self.dst.is_none()
    }

    /// Build from a `{src, dst, msg}` mapping; extra keys such as the type tag are ignored
    pub fn from_json(value: &Value) -> Result<Self, Error> {
        if !classify::is_chat_entry(value) {
            return Err(Error::MissingJsonKeys);
        }

        let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            src: field(keys::SRC).ok_or(Error::MissingJsonKeys)?,
            dst: field(keys::DST),
            msg: field(keys::MSG).ok_or(Error::MissingJsonKeys)?,
        })
    }

    /// Untagged `{src, dst, msg}` mapping, `dst` rendered as null for broadcasts
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields())
    }

    fn fields(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(keys::SRC.to_string(), Value::String(self.src.clone()));
        map.insert(
            keys::DST.to_string(),
            self.dst.clone().map_or(Value::Null, Value::String),
        );
        map.insert(keys::MSG.to_string(), Value::String(self.msg.clone()));
        map
    }
}

/// Handshake request; deliberately untagged
pub fn credentials_frame(credentials: &Credentials) -> String {
    let mut map = Map::new();
    map.insert(
        keys::USERNAME.to_string(),
        Value::String(credentials.username.clone()),
    );
    map.insert(
        keys::PASSWORD.to_string(),
        Value::String(credentials.password.clone()),
    );
    Value::Object(map).to_string()
}

/// `CHAT`-tagged frame for an outgoing message
pub fn chat_frame(message: &ChatMessage) -> String {
    let mut map = message.fields();
    map.insert(
        keys::MSG_TYPE.to_string(),
        Value::String(MessageType::Chat.as_str().to_string()),
    );
    Value::Object(map).to_string()
}

/// Decode one inbound frame into a typed envelope.
///
/// Anything that is not JSON, not a mapping, or lacks the type tag is
/// `Incorrect format`.
pub fn parse_envelope(raw: &str) -> Result<Value, Error> {
    let value: Value = serde_json::from_str(raw).map_err(|_| Error::IncorrectFormat)?;

    if classify::message_type(&value).is_none() {
        return Err(Error::IncorrectFormat);
    }

    Ok(value)
}
