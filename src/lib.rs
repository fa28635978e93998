//! Multi-worker request distribution for a single-host HTTP service.
//!
//! A front-end dispatcher accepts inbound connections, forwards each request
//! to one member of a fixed-size worker pool using a round-robin policy, and
//! recovers a worker's capacity when that worker deliberately restarts. The
//! request-handling logic behind each worker is an external collaborator
//! behind the [`worker::Handler`] trait.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌────────────────────────────────────────────────┐
//!                 │                CLUSTER BALANCER                │
//!  Client         │  ┌──────────┐   ┌────────┐   ┌──────────────┐ │
//!  ───────────────┼─▶│ dispatch │──▶│  ipc   │──▶│ pool slot 0..N│ │
//!  Request        │  │ (cursor) │   │envelope│   │  (links)      │ │
//!                 │  └────┬─────┘   └────────┘   └──────┬────────┘ │
//!                 │       │                             │          │
//!  Client         │       │    reply channel      ┌─────▼────────┐ │
//!  ◀──────────────┼───────┴────────────────────── │ worker       │ │
//!  Response       │                               │ runtime +    │ │
//!                 │                               │ handler      │ │
//!                 │  ┌──────────────────────────┐ └──────────────┘ │
//!                 │  │ config · lifecycle ·     │                  │
//!                 │  │ observability            │                  │
//!                 │  └──────────────────────────┘                  │
//!                 └────────────────────────────────────────────────┘
//! ```
//!
//! Each worker also binds its own listener on a derived port
//! (`PORT + 1 + index`) and serves the same handler directly.

// Core subsystems
pub mod config;
pub mod dispatch;
pub mod ipc;
pub mod pool;
pub mod worker;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::BalancerConfig;
pub use dispatch::Dispatcher;
pub use lifecycle::Shutdown;
pub use pool::WorkerPool;
