//! Round-robin dispatch cursor.
//!
//! # Design Decisions
//! - The cursor is owned by the dispatcher and exposed only as an
//!   `advance()`/`current()` pair; nothing else mutates it
//! - Advancing is unconditional: selection never consults worker liveness
//!   or backlog

use std::sync::atomic::{AtomicUsize, Ordering};

/// The single mutable integer behind round-robin selection.
#[derive(Debug, Default)]
pub struct DispatchCursor {
    next: AtomicUsize,
}

impl DispatchCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The index the next dispatch will use.
    pub fn current(&self) -> usize {
        self.next.load(Ordering::Relaxed)
    }

    /// Take the next index and advance, wrapping modulo `pool_len`.
    pub fn advance(&self, pool_len: usize) -> usize {
        debug_assert!(pool_len > 0);
        let mut current = self.next.load(Ordering::Relaxed);
        loop {
            let next = (current + 1) % pool_len;
            match self.next.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return current,
                Err(observed) => current = observed,
            }
        }
    }
}
