//! Dispatch-channel plumbing between the front door and the workers.
//!
//! # Data Flow
//! ```text
//! Accepted request
//!     → envelope.rs (snapshot method/url/headers)
//!     → codec.rs (encode as a single textual message)
//!     → Frame (payload + optional reply channel)
//!     → worker's link (mpsc)
//!     → codec.rs (decode: envelope or restart sentinel)
//!     → worker runtime
//! ```
//!
//! # Design Decisions
//! - The wire stays textual even though sender and receiver share an address
//!   space; the payload is exactly what a process boundary would carry
//! - The reply channel rides alongside the payload, not inside it: the
//!   dispatcher finalizes the client connection with whatever the worker
//!   sends back
//! - Control messages share the channel with envelopes (distinguished by
//!   payload shape)

pub mod codec;
pub mod envelope;

use tokio::sync::oneshot;

use crate::worker::handler::HandlerResponse;

pub use codec::{decode, encode_envelope, encode_restart, CodecError, IpcMessage, RESTART_SIGNAL};
pub use envelope::RequestEnvelope;

/// One message on a worker's parent link.
#[derive(Debug)]
pub struct Frame {
    /// The textual wire payload (envelope or control sentinel).
    pub payload: String,
    /// Where the worker sends the handler's response, when the dispatcher
    /// is waiting for one. Control frames carry no reply channel.
    pub reply: Option<oneshot::Sender<HandlerResponse>>,
}

impl Frame {
    /// A request frame whose response the dispatcher will relay.
    pub fn request(payload: String, reply: oneshot::Sender<HandlerResponse>) -> Self {
        Self {
            payload,
            reply: Some(reply),
        }
    }

    /// A fire-and-forget control frame.
    pub fn control(payload: String) -> Self {
        Self {
            payload,
            reply: None,
        }
    }
}
