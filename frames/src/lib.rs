//! Realtime frame model and protobuf codec for the pixel canvas transport.
//!
//! Every message on the canvas socket is a [`Frame`]: a namespaced `syscall`
//! (`"pixel:place"`, `"cooldown:notice"`, ...), a lifecycle [`Status`], the
//! canvas it concerns, and a free-form JSON payload. Payloads stay as
//! `serde_json::Value` so the engine can evolve its event shapes without a
//! schema change, while the bytes on the wire are a compact protobuf message
//! whose `data` field is a `google.protobuf.Value`.
//!
//! Numbers inside `data` travel as protobuf doubles. Whole values decode as
//! JSON integers (`2` and `2.0` both come back as `2`); anything else stays a
//! float.

use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error returned by [`decode_frame`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw bytes could not be decoded as a protobuf `WireFrame`.
    #[error("failed to decode protobuf frame: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The `status` integer on the wire does not map to a known [`Status`] variant.
    #[error("invalid frame status: {0}")]
    InvalidStatus(i32),
}

/// Lifecycle status of a frame in a request/response exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Request sent by a client.
    Request,
    /// Non-terminal pushed item (broadcasts such as `pixel:updated`).
    Item,
    /// Successful terminal response.
    Done,
    /// Error terminal response.
    Error,
    /// Cancellation frame.
    Cancel,
}

impl Status {
    /// Convert status into wire enum integer value.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        let wire = match self {
            Self::Request => WireFrameStatus::Request,
            Self::Item => WireFrameStatus::Item,
            Self::Done => WireFrameStatus::Done,
            Self::Error => WireFrameStatus::Error,
            Self::Cancel => WireFrameStatus::Cancel,
        };
        wire as i32
    }

    /// Whether this status ends a request/response exchange.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Cancel)
    }

    fn from_i32(value: i32) -> Result<Self, CodecError> {
        match WireFrameStatus::try_from(value) {
            Ok(WireFrameStatus::Request) => Ok(Self::Request),
            Ok(WireFrameStatus::Item) => Ok(Self::Item),
            Ok(WireFrameStatus::Done) => Ok(Self::Done),
            Ok(WireFrameStatus::Error) => Ok(Self::Error),
            Ok(WireFrameStatus::Cancel) => Ok(Self::Cancel),
            Err(_) => Err(CodecError::InvalidStatus(value)),
        }
    }
}

/// A single message on the realtime canvas socket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Unique identifier for this frame (UUID string).
    pub id: String,
    /// ID of the request frame this is responding to, if any.
    pub parent_id: Option<String>,
    /// Milliseconds since the Unix epoch when the frame was created (0 when unknown).
    pub ts: i64,
    /// Canvas this frame concerns, if any.
    pub canvas_id: Option<String>,
    /// Sender identifier (user id or system label).
    pub from: Option<String>,
    /// Namespaced operation name, e.g. `"pixel:place"`.
    pub syscall: String,
    /// Lifecycle position of the frame.
    pub status: Status,
    /// Arbitrary JSON payload.
    pub data: Value,
}

impl Frame {
    /// Build a fresh request frame with a random id.
    #[must_use]
    pub fn request(syscall: &str, canvas_id: Option<&str>, data: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            parent_id: None,
            ts: 0,
            canvas_id: canvas_id.map(str::to_owned),
            from: None,
            syscall: syscall.to_owned(),
            status: Status::Request,
            data,
        }
    }

    /// The `message` string of an error payload, if present.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.data.get("message").and_then(Value::as_str)
    }
}

/// Encode a frame into protobuf bytes.
#[must_use]
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let wire = frame_to_wire(frame);
    // `encode_to_vec` sizes the buffer up front, so encoding cannot fail.
    wire.encode_to_vec()
}

/// Decode protobuf bytes into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes and
/// [`CodecError::InvalidStatus`] for out-of-range status values.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, CodecError> {
    let wire = WireFrame::decode(bytes)?;
    wire_to_frame(wire)
}

fn frame_to_wire(frame: &Frame) -> WireFrame {
    WireFrame {
        id: frame.id.clone(),
        parent_id: frame.parent_id.clone(),
        ts: frame.ts,
        canvas_id: frame.canvas_id.clone(),
        from: frame.from.clone(),
        syscall: frame.syscall.clone(),
        status: frame.status.as_i32(),
        data: Some(json::to_proto(&frame.data)),
    }
}

fn wire_to_frame(wire: WireFrame) -> Result<Frame, CodecError> {
    Ok(Frame {
        id: wire.id,
        parent_id: wire.parent_id,
        ts: wire.ts,
        canvas_id: wire.canvas_id,
        from: wire.from,
        syscall: wire.syscall,
        status: Status::from_i32(wire.status)?,
        data: wire
            .data
            .map_or(Value::Object(Map::new()), |v| json::from_proto(&v)),
    })
}

/// JSON payloads as `google.protobuf.Value`.
mod json {
    use prost_types::value::Kind;
    use prost_types::{ListValue, NullValue, Struct};
    use serde_json::{Number, Value};

    /// Doubles are exact integers up to 2^53.
    const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

    pub(crate) fn to_proto(value: &Value) -> prost_types::Value {
        let kind = match value {
            Value::Null => Kind::NullValue(NullValue::NullValue.into()),
            Value::Bool(b) => Kind::BoolValue(*b),
            Value::Number(n) => Kind::NumberValue(n.as_f64().unwrap_or_default()),
            Value::String(s) => Kind::StringValue(s.clone()),
            Value::Array(items) => Kind::ListValue(ListValue { values: items.iter().map(to_proto).collect() }),
            Value::Object(map) => Kind::StructValue(Struct {
                fields: map.iter().map(|(k, v)| (k.clone(), to_proto(v))).collect(),
            }),
        };
        prost_types::Value { kind: Some(kind) }
    }

    pub(crate) fn from_proto(value: &prost_types::Value) -> Value {
        match &value.kind {
            None | Some(Kind::NullValue(_)) => Value::Null,
            Some(Kind::BoolValue(b)) => Value::Bool(*b),
            Some(Kind::NumberValue(n)) => number(*n),
            Some(Kind::StringValue(s)) => Value::String(s.clone()),
            Some(Kind::ListValue(list)) => list.values.iter().map(from_proto).collect(),
            Some(Kind::StructValue(st)) => {
                Value::Object(st.fields.iter().map(|(k, v)| (k.clone(), from_proto(v))).collect())
            }
        }
    }

    /// Whole doubles in the exact range decode as integers; NaN and
    /// infinities have no JSON form and become null.
    #[allow(clippy::cast_possible_truncation)]
    fn number(n: f64) -> Value {
        if n.is_finite() && n.fract().abs() < f64::EPSILON && n.abs() <= MAX_EXACT_INT {
            return Value::Number(Number::from(n as i64));
        }
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

#[derive(Clone, PartialEq, Message)]
struct WireFrame {
    #[prost(string, tag = "1")]
    id: String,
    #[prost(string, optional, tag = "2")]
    parent_id: Option<String>,
    #[prost(int64, tag = "3")]
    ts: i64,
    #[prost(string, optional, tag = "4")]
    canvas_id: Option<String>,
    #[prost(string, optional, tag = "5")]
    from: Option<String>,
    #[prost(string, tag = "6")]
    syscall: String,
    #[prost(enumeration = "WireFrameStatus", tag = "7")]
    status: i32,
    #[prost(message, optional, tag = "8")]
    data: Option<prost_types::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
enum WireFrameStatus {
    Request = 0,
    Done = 1,
    Error = 2,
    Cancel = 3,
    Item = 4,
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
