//! Worker subsystem.
//!
//! # Data Flow
//! ```text
//! Parent link frame
//!     → runtime.rs (decode, reconstruct request without body)
//!     → handler.rs (handle(request) -> response)
//!     → frame reply channel → dispatcher → client
//!
//! Direct connection on the worker's own port
//!     → runtime.rs (read body, build request)
//!     → handler.rs (same instance)
//!     → response on the same connection
//! ```
//!
//! # Design Decisions
//! - One handler instance per worker, never shared between workers
//! - The restart directive drains the worker's own listener before the
//!   task terminates

pub mod handler;
pub mod runtime;

pub use handler::{EchoHandler, Handler, HandlerFactory, HandlerRequest, HandlerResponse};
pub use runtime::{ExitOutcome, WorkerContext, WorkerEvent, WorkerRuntime};
