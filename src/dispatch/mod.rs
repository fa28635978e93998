//! Request-distribution subsystem.
//!
//! # Data Flow
//! ```text
//! Client connection
//!     → server.rs (accept, build envelope from method/url/headers)
//!     → cursor.rs (next index, wrap modulo pool size)
//!     → pool slot link (frame: payload + reply channel)
//!     → worker handles the envelope
//!     → reply channel → server.rs finalizes the client connection
//! ```
//!
//! # Design Decisions
//! - One dispatcher, one cursor; nothing else advances it
//! - Routing decision and response delivery share the accepted connection:
//!   the dispatcher relays whatever the worker sends back

pub mod cursor;
pub mod server;

pub use cursor::DispatchCursor;
pub use server::Dispatcher;
