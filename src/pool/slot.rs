//! Worker slot abstraction.
//!
//! # Responsibilities
//! - Represent one stable position in the worker pool
//! - Hold the link to whichever worker currently occupies the slot
//! - Track the slot's liveness state
//!
//! # Design Decisions
//! - The slot is the stable identity; the worker behind it changes on
//!   restart. Replacing the occupant swaps the link in place, never the slot
//! - Link reads sit on the dispatch hot path, so the link lives in an
//!   `ArcSwapOption` and state in an atomic; the supervisor is the only
//!   writer

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::ipc::Frame;

/// Liveness state of a worker slot.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Slot created, listener not yet bound.
    Starting = 0,
    /// Listener bound, accepting envelopes.
    Running = 1,
    /// Restart directive sent, draining.
    Restarting = 2,
    /// Worker terminated; the slot serves nothing until replaced.
    Dead = 3,
}

impl From<u8> for WorkerState {
    fn from(val: u8) -> Self {
        match val {
            1 => WorkerState::Running,
            2 => WorkerState::Restarting,
            3 => WorkerState::Dead,
            _ => WorkerState::Starting,
        }
    }
}

/// The link to the worker currently occupying a slot.
#[derive(Debug)]
pub struct WorkerLink {
    /// Monotonic id of the worker instance, the process-id analog.
    pub generation: u64,
    /// Sender half of the worker's parent link.
    pub frames: mpsc::UnboundedSender<Frame>,
    /// Forced-termination handle, the kill analog.
    pub abort: AbortHandle,
}

/// One stable position in the worker pool.
#[derive(Debug)]
pub struct WorkerSlot {
    /// Zero-based pool index, stable for the lifetime of the pool.
    pub index: usize,
    /// The worker's own listening port, derived from the index.
    pub port: u16,
    link: ArcSwapOption<WorkerLink>,
    state: AtomicU8,
}

impl WorkerSlot {
    pub fn new(index: usize, port: u16) -> Self {
        Self {
            index,
            port,
            link: ArcSwapOption::from(None),
            state: AtomicU8::new(WorkerState::Starting as u8),
        }
    }

    /// Current link, if a worker occupies the slot.
    pub fn link(&self) -> Option<Arc<WorkerLink>> {
        self.link.load_full()
    }

    /// Install the link of a freshly spawned worker.
    pub fn install(&self, link: WorkerLink) {
        self.link.store(Some(Arc::new(link)));
    }

    pub fn state(&self) -> WorkerState {
        self.state.load(Ordering::Relaxed).into()
    }

    pub fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Relaxed);
    }

    /// Generation of the current occupant, 0 if the slot is empty.
    pub fn generation(&self) -> u64 {
        self.link().map(|l| l.generation).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let slot = WorkerSlot::new(2, 4003);
        assert_eq!(slot.state(), WorkerState::Starting);
        slot.set_state(WorkerState::Running);
        assert_eq!(slot.state(), WorkerState::Running);
        slot.set_state(WorkerState::Dead);
        assert_eq!(slot.state(), WorkerState::Dead);
    }

    #[test]
    fn test_empty_slot_has_no_generation() {
        let slot = WorkerSlot::new(0, 4001);
        assert!(slot.link().is_none());
        assert_eq!(slot.generation(), 0);
    }
}
