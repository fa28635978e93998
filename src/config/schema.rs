//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so a minimal (or absent) config file works.

use serde::{Deserialize, Serialize};

/// Root configuration for the balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BalancerConfig {
    /// Front-door listener configuration.
    pub listener: ListenerConfig,

    /// Worker pool configuration.
    pub pool: PoolConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl BalancerConfig {
    /// Address the dispatcher binds.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listener.bind_host, self.listener.port)
    }

    /// Port the worker at `index` binds. Offset by one so index 0 does not
    /// collide with the dispatcher's own port.
    pub fn worker_port(&self, index: usize) -> u16 {
        self.listener.port + 1 + index as u16
    }
}

/// Front-door listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host the dispatcher and workers bind (e.g. "0.0.0.0").
    pub bind_host: String,

    /// Dispatcher port. Overridden by the `PORT` environment variable.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 4000,
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of workers. Defaults to available CPU cores minus one.
    pub size: usize,

    /// How long a pool-wide shutdown waits for workers to drain, in seconds.
    pub drain_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: default_pool_size(),
            drain_timeout_secs: 5,
        }
    }
}

/// Available CPU cores minus one, never below one.
fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
