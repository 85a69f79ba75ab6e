// ABOUTME: Shape checks for decoded JSON frames
// ABOUTME: Total predicates that never panic on arbitrary untrusted input

use crate::protocol::keys::{self, MessageType};
use serde_json::{Map, Value};

/// Chat frame: tag `CHAT` plus string `src`, `msg` and a string-or-null `dst`
pub fn is_chat_message(value: &Value) -> bool {
    match value {
        Value::Object(map) => has_tag(map, MessageType::Chat) && has_chat_fields(map),
        _ => false,
    }
}

/// Authentication success frame: tag `AUTH_SUCCESS` plus a list-valued `chats`
pub fn is_auth_success_message(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            has_tag(map, MessageType::AuthSuccess)
                && matches!(map.get(keys::CHATS), Some(Value::Array(_)))
        }
        _ => false,
    }
}

/// Backlog entry: chat fields without a type tag
pub fn is_chat_entry(value: &Value) -> bool {
    match value {
        Value::Object(map) => has_chat_fields(map),
        _ => false,
    }
}

/// The raw type tag of a frame, if it is a mapping carrying one
pub fn message_type(value: &Value) -> Option<&Value> {
    value.as_object()?.get(keys::MSG_TYPE)
}

fn has_tag(map: &Map<String, Value>, expected: MessageType) -> bool {
    map.get(keys::MSG_TYPE).and_then(Value::as_str) == Some(expected.as_str())
}

fn has_chat_fields(map: &Map<String, Value>) -> bool {
    is_string(map, keys::SRC)
        && is_string(map, keys::MSG)
        // A missing dst is a shape error; an explicit null is a broadcast
        && matches!(map.get(keys::DST), Some(Value::String(_) | Value::Null))
}

fn is_string(map: &Map<String, Value>, key: &str) -> bool {
    matches!(map.get(key), Some(Value::String(_)))
}
