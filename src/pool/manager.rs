//! Worker pool lifecycle management.
//!
//! # Responsibilities
//! - Spawn the fixed-size pool at start-up, assigning stable indices
//! - Replace a worker in place when it asks for a restart
//! - Observe every worker exit and keep slot state honest
//! - Drain the whole pool on shutdown
//!
//! # Design Decisions
//! - A worker that dies without first sending the restart signal is *not*
//!   replaced: its exit is logged and the slot goes Dead. Capacity loss on
//!   crash is an explicit policy, not an accident
//! - The replacement binds only after the old occupant's exit is observed,
//!   so old and new never contend for the port
//! - An in-flight dispatch holding the old link is best-effort and is not
//!   retracted when the link is swapped

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::BalancerConfig;
use crate::ipc::{self, Frame};
use crate::observability::metrics;
use crate::pool::slot::{WorkerLink, WorkerSlot, WorkerState};
use crate::worker::{ExitOutcome, HandlerFactory, WorkerEvent, WorkerRuntime};

/// Error type for pool start-up.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to bind worker {index} on port {port}: {source}")]
    Bind {
        index: usize,
        port: u16,
        source: std::io::Error,
    },
}

/// The ordered, fixed-length worker pool.
///
/// The sequence never shrinks: a dead occupant is replaced in place (or left
/// Dead), preserving index stability so round-robin arithmetic stays valid.
pub struct WorkerPool {
    slots: Vec<WorkerSlot>,
}

impl WorkerPool {
    /// Spawn `config.pool.size` workers sequentially and start the
    /// supervisor loop.
    ///
    /// Returns the pool alongside the supervisor's join handle. The handle
    /// resolves only after the supervisor has finished the pool-wide drain,
    /// so callers must await it after shutdown fires or workers are torn
    /// down mid-drain.
    pub async fn spawn(
        config: &BalancerConfig,
        factory: Arc<dyn HandlerFactory>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(Arc<Self>, JoinHandle<()>), PoolError> {
        let size = config.pool.size;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let slots = (0..size)
            .map(|index| WorkerSlot::new(index, config.worker_port(index)))
            .collect();
        let pool = Arc::new(Self { slots });

        let spawner = WorkerSpawner {
            bind_host: config.listener.bind_host.clone(),
            factory,
            events: events_tx,
            next_generation: AtomicU64::new(1),
        };

        for index in 0..size {
            spawner.spawn(&pool, index).await?;
        }

        tracing::info!(pool_size = size, "Worker pool started");

        let supervisor = Supervisor {
            pool: pool.clone(),
            spawner,
            events: events_rx,
            pending_replace: HashMap::new(),
            drain_timeout: Duration::from_secs(config.pool.drain_timeout_secs),
        };
        let supervisor = tokio::spawn(supervisor.run(shutdown));

        Ok((pool, supervisor))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Read access for the dispatcher and for inspection. Indices come from
    /// the cursor modulo `len`, so they are always in range.
    pub fn slot(&self, index: usize) -> &WorkerSlot {
        &self.slots[index]
    }

    /// Operator-initiated restart directive: the worker drains and exits,
    /// and is not replaced.
    pub fn stop_worker(&self, index: usize) {
        let slot = &self.slots[index];
        if let Some(link) = slot.link() {
            tracing::info!(
                worker_id = link.generation,
                worker_index = index,
                "Stopping worker"
            );
            slot.set_state(WorkerState::Restarting);
            let _ = link.frames.send(Frame::control(ipc::encode_restart()));
        }
    }

    /// Forcibly terminate a worker, the kill analog. The exit is observed
    /// and logged; the worker is not replaced.
    pub fn abort_worker(&self, index: usize) {
        if let Some(link) = self.slots[index].link() {
            link.abort.abort();
        }
    }
}

/// Everything needed to fork one worker into a slot.
struct WorkerSpawner {
    bind_host: String,
    factory: Arc<dyn HandlerFactory>,
    events: mpsc::UnboundedSender<WorkerEvent>,
    next_generation: AtomicU64,
}

impl WorkerSpawner {
    /// Bind, launch, and install a worker for `index`. The slot reaches
    /// Running only once the listener is bound.
    async fn spawn(&self, pool: &Arc<WorkerPool>, index: usize) -> Result<(), PoolError> {
        let slot = pool.slot(index);
        slot.set_state(WorkerState::Starting);

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let listener =
            bind_worker(&self.bind_host, slot.port)
                .await
                .map_err(|source| PoolError::Bind {
                    index,
                    port: slot.port,
                    source,
                })?;

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let runtime = WorkerRuntime::new(
            index,
            generation,
            listener,
            self.factory.build(),
            frames_rx,
            self.events.clone(),
        );
        let join = tokio::spawn(runtime.run());
        let abort = join.abort_handle();

        // Exit watcher: every termination surfaces as one Exited event.
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = match join.await {
                Ok(()) => ExitOutcome::Clean,
                Err(e) if e.is_panic() => ExitOutcome::Panicked,
                Err(_) => ExitOutcome::Killed,
            };
            let _ = events.send(WorkerEvent::Exited {
                index,
                generation,
                outcome,
            });
        });

        slot.install(WorkerLink {
            generation,
            frames: frames_tx,
            abort,
        });
        slot.set_state(WorkerState::Running);

        tracing::info!(
            worker_id = generation,
            worker_index = index,
            port = slot.port,
            "Worker started"
        );
        Ok(())
    }
}

/// Bind a worker listener. The previous occupant's socket may close a beat
/// after its task exit is observed, so tolerate a brief AddrInUse window.
async fn bind_worker(host: &str, port: u16) -> std::io::Result<TcpListener> {
    let mut attempts = 0;
    loop {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse && attempts < 10 => {
                attempts += 1;
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// The pool's control loop: consumes worker events and drives the restart
/// protocol.
struct Supervisor {
    pool: Arc<WorkerPool>,
    spawner: WorkerSpawner,
    events: mpsc::UnboundedReceiver<WorkerEvent>,
    /// index → generation whose exit should trigger a replacement.
    pending_replace: HashMap<usize, u64>,
    drain_timeout: Duration,
}

impl Supervisor {
    async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(WorkerEvent::RestartRequested { index, generation }) => {
                        self.on_restart_request(index, generation);
                    }
                    Some(WorkerEvent::Exited { index, generation, outcome }) => {
                        self.on_exit(index, generation, outcome).await;
                    }
                    None => break,
                },
                _ = shutdown.recv() => {
                    self.drain_all().await;
                    break;
                }
            }
        }
    }

    /// Upward restart signal: mark the slot, direct the occupant to exit,
    /// and remember to replace it once the exit is observed.
    fn on_restart_request(&mut self, index: usize, generation: u64) {
        let slot = self.pool.slot(index);
        match slot.link() {
            Some(link) if link.generation == generation => {
                tracing::info!(
                    worker_id = generation,
                    worker_index = index,
                    "Worker requested restart"
                );
                slot.set_state(WorkerState::Restarting);
                self.pending_replace.insert(index, generation);
                let _ = link.frames.send(Frame::control(ipc::encode_restart()));
            }
            _ => {
                tracing::debug!(
                    worker_id = generation,
                    worker_index = index,
                    "Stale restart request ignored"
                );
            }
        }
    }

    async fn on_exit(&mut self, index: usize, generation: u64, outcome: ExitOutcome) {
        match outcome {
            ExitOutcome::Clean => tracing::info!(
                worker_id = generation,
                worker_index = index,
                code = 0,
                "Worker exited"
            ),
            ExitOutcome::Panicked => tracing::error!(
                worker_id = generation,
                worker_index = index,
                "Worker panicked"
            ),
            ExitOutcome::Killed => tracing::warn!(
                worker_id = generation,
                worker_index = index,
                "Worker was killed"
            ),
        }
        metrics::record_worker_exit(index, outcome);

        if self.pending_replace.get(&index) == Some(&generation) {
            self.pending_replace.remove(&index);
            match self.spawner.spawn(&self.pool, index).await {
                Ok(()) => {
                    metrics::record_restart(index);
                    tracing::info!(worker_index = index, "Replacement worker online");
                }
                Err(e) => {
                    self.pool.slot(index).set_state(WorkerState::Dead);
                    tracing::error!(
                        worker_index = index,
                        error = %e,
                        "Failed to spawn replacement worker"
                    );
                }
            }
        } else if self.pool.slot(index).generation() == generation {
            // Observation only: no restart signal preceded this exit, so the
            // slot's serving capacity is lost until an operator intervenes.
            self.pool.slot(index).set_state(WorkerState::Dead);
        }
    }

    /// Pool-wide drain: direct every live worker to exit, then wait for the
    /// exits up to the configured deadline.
    async fn drain_all(&mut self) {
        tracing::info!("Draining worker pool");
        let mut expected = HashSet::new();
        for slot in &self.pool.slots {
            if slot.state() == WorkerState::Dead {
                continue;
            }
            if let Some(link) = slot.link() {
                slot.set_state(WorkerState::Restarting);
                if link
                    .frames
                    .send(Frame::control(ipc::encode_restart()))
                    .is_ok()
                {
                    expected.insert(link.generation);
                }
            }
        }

        let deadline = tokio::time::Instant::now() + self.drain_timeout;
        while !expected.is_empty() {
            match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Some(WorkerEvent::Exited {
                    index, generation, ..
                })) => {
                    expected.remove(&generation);
                    self.pool.slot(index).set_state(WorkerState::Dead);
                }
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        remaining = expected.len(),
                        "Drain deadline expired with workers still running"
                    );
                    break;
                }
            }
        }
    }
}
