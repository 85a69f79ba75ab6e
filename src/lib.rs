// ABOUTME: Main library entry point for chatwire
// ABOUTME: Exports public API for the chat session client and its wire protocol

//! # chatwire
//!
//! Client-side session layer for a JSON text chat protocol carried over a
//! persistent WebSocket connection.
//!
//! A [`Session`] authenticates with a username and password, receives the
//! server's chat backlog, then sends chat messages fire-and-forget while a
//! [`ReceiveLoop`] classifies inbound frames and hands chat messages to the
//! application.

#![warn(missing_docs)]

/// Wire schema, message classification and the session state machine
pub mod protocol;
/// Frame transports (WebSocket and in-memory)
pub mod transport;

pub use error::make_error;
pub use protocol::client::{Connector, ReceiveLoop, Session, SessionState};
pub use protocol::keys::MessageType;
pub use protocol::messages::{ChatMessage, Credentials};
pub use transport::Transport;

/// Result type for chatwire operations
pub type Result<T> = std::result::Result<T, error::Error>;

/// Error types for chatwire
pub mod error {
    use crate::protocol::keys::{self, MessageType};
    use serde_json::Value;
    use thiserror::Error;

    /// Error types for chatwire operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum Error {
        /// Frame was not JSON, or not a typed envelope
        #[error("Incorrect format")]
        IncorrectFormat,

        /// Server reported a frame with missing keys
        #[error("Missing JSON keys")]
        MissingJsonKeys,

        /// Server rejected the credentials
        #[error("Invalid credentials")]
        InvalidCredentials,

        /// Frame carried no type tag
        #[error("{key} key not found in JSON", key = keys::MSG_TYPE)]
        MissingMessageType,

        /// Frame carried a type tag outside the error taxonomy
        #[error("Unknown message type: {0}")]
        UnknownMessageType(String),

        /// WebSocket-related error on an open connection
        #[error("WebSocket error: {0}")]
        WebSocket(String),

        /// Connection could not be established
        #[error("Connection error: {0}")]
        Connection(String),

        /// Peer closed the connection
        #[error("Connection closed")]
        ConnectionClosed,

        /// Handshake did not complete in time
        #[error("Timed out waiting for authentication response")]
        Timeout,
    }

    impl Error {
        /// Whether this error comes from the transport rather than the protocol taxonomy
        pub fn is_transport(&self) -> bool {
            matches!(
                self,
                Error::WebSocket(_) | Error::Connection(_) | Error::ConnectionClosed | Error::Timeout
            )
        }
    }

    /// Map a wire type tag to its protocol error.
    ///
    /// Total: every input yields an error, and the same tag always yields the
    /// same message text. `None` means the frame had no type tag at all.
    pub fn make_error(tag: Option<&str>) -> Error {
        let Some(tag) = tag else {
            return Error::MissingMessageType;
        };

        match MessageType::from_tag(tag) {
            Some(MessageType::IncorrectFormat) => Error::IncorrectFormat,
            Some(MessageType::MissingJsonKeys) => Error::MissingJsonKeys,
            Some(MessageType::InvalidCredentials) => Error::InvalidCredentials,
            // AUTH_SUCCESS and CHAT are not failures, so they are unexpected here
            _ => Error::UnknownMessageType(tag.to_string()),
        }
    }

    /// Map a decoded tag value to its protocol error.
    ///
    /// Non-string tags are reported as unknown types using their JSON text.
    pub fn make_error_from_value(tag: Option<&Value>) -> Error {
        match tag {
            None => make_error(None),
            Some(Value::String(tag)) => make_error(Some(tag)),
            Some(other) => Error::UnknownMessageType(other.to_string()),
        }
    }
}
