// ABOUTME: Protocol implementation for the chat WebSocket protocol
// ABOUTME: Wire schema, frame classification, message types, and session client

/// Frame classification over untyped JSON
pub mod classify;
/// Session handshake, send path, and receive loop
pub mod client;
/// Wire field names and message type tags
pub mod keys;
/// Chat message and frame construction
pub mod messages;

pub use keys::MessageType;
pub use messages::ChatMessage;
