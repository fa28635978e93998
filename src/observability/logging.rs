//! Structured logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the tracing subscriber. `RUST_LOG` wins over the configured
/// level when set.
pub fn init(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("cluster_balancer={log_level},tower_http=warn").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
