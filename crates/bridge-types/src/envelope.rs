//! # Request and Response Envelopes
//!
//! The wire format is a flat JSON object on both topics:
//!
//! ```text
//! request:  {"type": <string>, "correlationId": <string>, ...action fields}
//! response: {"status": <int>, "msg": <string>, "correlationId": <string|null>, ...body}
//! ```
//!
//! ## Decoding Rules
//!
//! - `type` and `correlationId` are lifted out of the object before any
//!   action-specific validation. A value of the wrong JSON type is treated as
//!   absent rather than failing the whole message.
//! - When the bytes cannot be decoded at all, a best-effort scan of the raw
//!   bytes recovers the correlation id so the caller can still be answered.

use crate::correlation::CorrelationId;
use crate::errors::{DecodeFailure, EnvelopeError};
use crate::status::Status;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Untyped key/value body of an envelope.
pub type Payload = Map<String, Value>;

/// Request field selecting the handler.
pub const TYPE_FIELD: &str = "type";
/// Correlation field, identical on both topics.
pub const CORRELATION_FIELD: &str = "correlationId";
/// Response status field.
pub const STATUS_FIELD: &str = "status";
/// Response summary field.
pub const MSG_FIELD: &str = "msg";

/// Keys a response body may not carry; the envelope owns them.
const RESPONSE_RESERVED: [&str; 3] = [STATUS_FIELD, MSG_FIELD, CORRELATION_FIELD];

// =============================================================================
// REQUEST
// =============================================================================

/// A decoded request message.
///
/// Created per message by the listener and discarded after dispatch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestEnvelope {
    /// The `type` tag, if present and a string.
    pub action: Option<String>,
    /// The caller's correlation id, if present and a string.
    pub correlation_id: Option<CorrelationId>,
    /// Every other field of the request object.
    pub payload: Payload,
}

impl RequestEnvelope {
    pub fn new(action: impl Into<String>, correlation_id: impl Into<CorrelationId>) -> Self {
        Self {
            action: Some(action.into()),
            correlation_id: Some(correlation_id.into()),
            payload: Payload::new(),
        }
    }

    /// Add an action-specific field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Split a JSON object into tag, correlation id and payload.
    pub fn from_object(mut object: Payload) -> Self {
        let action = match object.remove(TYPE_FIELD) {
            Some(Value::String(tag)) => Some(tag),
            Some(other) => {
                warn!(kind = json_kind(&other), "Ignoring non-string request type");
                None
            }
            None => None,
        };
        let correlation_id = match object.remove(CORRELATION_FIELD) {
            Some(Value::String(id)) => Some(CorrelationId::from(id)),
            Some(other) => {
                warn!(kind = json_kind(&other), "Ignoring non-string correlation id");
                None
            }
            None => None,
        };
        Self {
            action,
            correlation_id,
            payload: object,
        }
    }

    /// Decode raw message bytes.
    ///
    /// On failure the returned `DecodeFailure` carries any correlation id that
    /// could be salvaged from the bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeFailure> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| DecodeFailure {
            error: EnvelopeError::MalformedJson(e.to_string()),
            salvaged: salvage_correlation_id(bytes),
        })?;

        match value {
            Value::Object(object) => Ok(Self::from_object(object)),
            other => Err(DecodeFailure {
                error: EnvelopeError::NotAnObject(json_kind(&other)),
                salvaged: salvage_correlation_id(bytes),
            }),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        serde_json::to_vec(self).map_err(|e| EnvelopeError::Encode(e.to_string()))
    }
}

impl Serialize for RequestEnvelope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        if let Some(action) = &self.action {
            map.serialize_entry(TYPE_FIELD, action)?;
        }
        if let Some(id) = &self.correlation_id {
            map.serialize_entry(CORRELATION_FIELD, id)?;
        }
        for (key, value) in &self.payload {
            if key != TYPE_FIELD && key != CORRELATION_FIELD {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RequestEnvelope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Payload::deserialize(deserializer).map(Self::from_object)
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// A response message.
///
/// Handlers build these without a correlation id; the dispatcher stamps the
/// id captured from the request before the envelope leaves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: Status,
    pub msg: String,
    #[serde(rename = "correlationId", default)]
    pub correlation_id: Option<CorrelationId>,
    /// Handler-specific result fields, flattened into the top-level object.
    #[serde(flatten)]
    pub body: Payload,
}

impl ResponseEnvelope {
    pub fn new(status: Status, msg: impl Into<String>) -> Self {
        Self {
            status,
            msg: msg.into(),
            correlation_id: None,
            body: Payload::new(),
        }
    }

    pub fn ok(msg: impl Into<String>) -> Self {
        Self::new(Status::Ok, msg)
    }

    pub fn created(msg: impl Into<String>) -> Self {
        Self::new(Status::Created, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(Status::BadRequest, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(Status::Unauthorized, msg)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(Status::Forbidden, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(Status::NotFound, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(Status::InternalError, msg)
    }

    /// Attach a body field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }

    /// Body field lookup.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// Overwrite the correlation id and drop any reserved keys a handler may
    /// have smuggled into the body.
    ///
    /// After stamping, the serialized object has exactly one `status`, `msg`
    /// and `correlationId` key.
    #[must_use]
    pub fn stamp(mut self, correlation_id: Option<CorrelationId>) -> Self {
        for key in RESPONSE_RESERVED {
            self.body.remove(key);
        }
        self.correlation_id = correlation_id;
        self
    }

    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        serde_json::to_vec(self).map_err(|e| EnvelopeError::Encode(e.to_string()))
    }

    /// Decode a response (caller side).
    pub fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        serde_json::from_slice(bytes).map_err(|e| EnvelopeError::MalformedJson(e.to_string()))
    }
}

// =============================================================================
// SALVAGE
// =============================================================================

/// Best-effort recovery of `"correlationId": "<string>"` from bytes that did
/// not decode as a JSON object.
pub fn salvage_correlation_id(bytes: &[u8]) -> Option<CorrelationId> {
    let needle = b"\"correlationId\"";
    let mut from = 0;
    while let Some(pos) = find(&bytes[from..], needle) {
        let after_key = from + pos + needle.len();
        if let Some(id) = read_string_value(&bytes[after_key..]) {
            return Some(id);
        }
        from = after_key;
    }
    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn skip_whitespace(bytes: &[u8], mut index: usize) -> usize {
    while bytes.get(index).is_some_and(u8::is_ascii_whitespace) {
        index += 1;
    }
    index
}

/// Reads `: "<string>"` and unescapes the string through `serde_json`.
fn read_string_value(rest: &[u8]) -> Option<CorrelationId> {
    let colon = skip_whitespace(rest, 0);
    if rest.get(colon) != Some(&b':') {
        return None;
    }
    let open = skip_whitespace(rest, colon + 1);
    if rest.get(open) != Some(&b'"') {
        return None;
    }

    let mut escaped = false;
    for (offset, &byte) in rest[open + 1..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' => escaped = true,
            b'"' => {
                let close = open + 1 + offset;
                return serde_json::from_slice::<String>(&rest[open..=close])
                    .ok()
                    .map(CorrelationId::from);
            }
            _ => {}
        }
    }
    None
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
