//! Event and record types exchanged with the broker.

use serde_json::{Map, Value};

use crate::{Error, Result};

/// An inbound event headed for Kafka.
///
/// The payload is an arbitrary JSON object. The optional key routes the
/// event to a fixed partition; the optional topic overrides the publisher's
/// default.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    pub payload: Map<String, Value>,
    pub key: Option<Vec<u8>>,
    pub topic: Option<String>,
}

impl Event {
    pub fn new(payload: Map<String, Value>) -> Self {
        Self {
            payload,
            key: None,
            topic: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Encode the payload as UTF-8 JSON, the value format on the wire.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.payload).map_err(Into::into)
    }
}

impl TryFrom<Value> for Event {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Event::new(map)),
            other => Err(Error::InvalidEvent(format!(
                "event payload must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A single message ready to hand to a producer client.
#[derive(Debug, Clone, Copy)]
pub struct OutboundRecord<'a> {
    pub topic: &'a str,
    pub key: Option<&'a [u8]>,
    pub payload: &'a [u8],
}

/// Broker acknowledgment for a delivered record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub partition: i32,
    pub offset: i64,
}
