//! Wire codec for the dispatch channel.
//!
//! # Responsibilities
//! - Encode envelopes and the restart sentinel as single textual messages
//! - Decode inbound payloads, distinguishing the two by payload shape
//!
//! # Design Decisions
//! - One channel carries both request envelopes and the control sentinel;
//!   receivers tell them apart by content, not by a separate channel
//! - The sentinel is the literal JSON string `"restart"`

use serde_json::Value;
use thiserror::Error;

use crate::ipc::envelope::RequestEnvelope;

/// The restart sentinel as it appears before encoding.
pub const RESTART_SIGNAL: &str = "restart";

/// A decoded dispatch-channel message.
#[derive(Debug, Clone, PartialEq)]
pub enum IpcMessage {
    /// A request to replay through the worker's handler.
    Request(RequestEnvelope),
    /// The restart directive / restart request sentinel.
    Restart,
}

/// Error type for payload decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("payload is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unrecognized control message: {0:?}")]
    UnknownControl(String),
    #[error("payload is neither an envelope nor a control message")]
    Shape,
}

/// Serialize an envelope for transmission.
pub fn encode_envelope(envelope: &RequestEnvelope) -> Result<String, serde_json::Error> {
    serde_json::to_string(envelope)
}

/// Serialize the restart sentinel for transmission.
pub fn encode_restart() -> String {
    // A JSON string literal; cannot fail to serialize.
    format!("\"{}\"", RESTART_SIGNAL)
}

/// Decode a single textual message from the dispatch channel.
pub fn decode(payload: &str) -> Result<IpcMessage, CodecError> {
    let value: Value = serde_json::from_str(payload)?;
    match value {
        Value::Object(_) => {
            let envelope: RequestEnvelope = serde_json::from_value(value)?;
            Ok(IpcMessage::Request(envelope))
        }
        Value::String(s) if s == RESTART_SIGNAL => Ok(IpcMessage::Restart),
        Value::String(s) => Err(CodecError::UnknownControl(s)),
        _ => Err(CodecError::Shape),
    }
}
