//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → structured log events (tracing)
//!     → counters and histograms (metrics facade)
//!
//! Consumers:
//!     → stdout (fmt layer, EnvFilter)
//!     → Prometheus scrape endpoint (config-gated)
//! ```
//!
//! # Design Decisions
//! - Request ID flows from the front door into the envelope headers, so
//!   worker-side logs correlate with dispatcher-side logs
//! - Metric updates are atomic increments; nothing blocks on them

pub mod logging;
pub mod metrics;
