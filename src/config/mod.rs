//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → PORT environment override
//!     → validation.rs (semantic checks)
//!     → BalancerConfig (validated, immutable)
//!     → shared by value with the pool and dispatcher
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so the binary runs with no config file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{BalancerConfig, ListenerConfig, ObservabilityConfig, PoolConfig};
