//! Message: payload + acknowledgment handle, as handed out by a queue.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque token the transport needs to delete (acknowledge) one fetched message.
///
/// The engine never inspects or rewrites it; a succeeded message is
/// acknowledged with exactly the handle it arrived with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AckHandle(String);

impl AckHandle {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AckHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One message of a fetched batch.
///
/// Owned by the engine for the duration of a single iteration only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    payload: serde_json::Value,
    ack_handle: AckHandle,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    message_id: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
}

impl Message {
    pub fn new(payload: serde_json::Value, ack_handle: AckHandle) -> Self {
        Self {
            payload,
            ack_handle,
            message_id: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn ack_handle(&self) -> &AckHandle {
        &self.ack_handle
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_handle_serializes_as_plain_string() {
        let s = serde_json::to_string(&AckHandle::new("rh-1")).unwrap();
        assert_eq!(s, "\"rh-1\"");
    }

    #[test]
    fn message_skips_empty_metadata() {
        let m = Message::new(serde_json::json!({"n": 1}), AckHandle::new("a"));
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["ack_handle"], "a");
        assert!(v.get("message_id").is_none());
        assert!(v.get("attributes").is_none());
    }

    #[test]
    fn attributes_are_carried() {
        let m = Message::new(serde_json::Value::Null, AckHandle::new("a"))
            .with_message_id("m-1")
            .with_attribute("source", "billing");
        assert_eq!(m.message_id(), Some("m-1"));
        assert_eq!(m.attribute("source"), Some("billing"));
        assert_eq!(m.attribute("missing"), None);
    }
}
