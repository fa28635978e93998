//! Worker pool subsystem.
//!
//! # Data Flow
//! ```text
//! Start-up:
//!     spawn size workers sequentially (index 0..size)
//!         → bind derived port → launch runtime → install link → Running
//!
//! Restart (worker-initiated):
//!     RestartRequested event
//!         → slot Restarting → directive downward → exit observed
//!         → replacement forked for the same index → link swapped → Running
//!
//! Any other exit:
//!     Exited event → logged → slot Dead (no replacement)
//! ```
//!
//! # Design Decisions
//! - The pool never shrinks; slots are replaced in place so round-robin
//!   index arithmetic stays valid
//! - The supervisor loop is the only mutator of slot links and states
//! - No retry/backoff state: a dead slot stays dead until an operator acts

pub mod manager;
pub mod slot;

pub use manager::{PoolError, WorkerPool};
pub use slot::{WorkerLink, WorkerSlot, WorkerState};
