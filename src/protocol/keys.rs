// ABOUTME: Wire schema for chat protocol frames
// ABOUTME: JSON field names and the closed set of message type tags

/// Type tag field present on every typed frame
pub const MSG_TYPE: &str = "type";
/// Sender username on chat frames
pub const SRC: &str = "src";
/// Recipient username on chat frames (null for broadcast)
pub const DST: &str = "dst";
/// Chat text body
pub const MSG: &str = "msg";
/// Backlog list on the authentication success frame
pub const CHATS: &str = "chats";
/// Username on the handshake request
pub const USERNAME: &str = "username";
/// Password on the handshake request
pub const PASSWORD: &str = "password";

/// Message type tags carried in the [`MSG_TYPE`] field
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Server could not parse a frame
    IncorrectFormat,
    /// Server found a frame lacking required keys
    MissingJsonKeys,
    /// Handshake rejected
    InvalidCredentials,
    /// Handshake accepted, carries the backlog
    AuthSuccess,
    /// Chat message
    Chat,
}

impl MessageType {
    /// All tags, in wire order
    pub const ALL: [MessageType; 5] = [
        MessageType::IncorrectFormat,
        MessageType::MissingJsonKeys,
        MessageType::InvalidCredentials,
        MessageType::AuthSuccess,
        MessageType::Chat,
    ];

    /// Tag as it appears on the wire
    pub const fn as_str(self) -> &'static str {
        match self {
            MessageType::IncorrectFormat => "INCORRECT_FORMAT",
            MessageType::MissingJsonKeys => "MISSING_JSON_KEYS",
            MessageType::InvalidCredentials => "INVALID_CREDENTIALS",
            MessageType::AuthSuccess => "AUTH_SUCCESS",
            MessageType::Chat => "CHAT",
        }
    }

    /// Parse a wire tag; tags are case-sensitive
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
