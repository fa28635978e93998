//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate → Init observability → Spawn pool
//!         → Bind dispatcher → Accept traffic
//!
//! Shutdown:
//!     Signal received → Dispatcher stops accepting
//!         → Pool drains workers (restart directive to each, bounded wait)
//!         → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, pool before the front door binds
//! - Shutdown drain has a deadline; workers still running at the deadline
//!   are logged and abandoned

pub mod shutdown;

pub use shutdown::Shutdown;
