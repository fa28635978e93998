//! Semantic configuration checks, applied after deserialization.

use thiserror::Error;

use crate::config::schema::BalancerConfig;

/// A single semantic violation found during validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("pool.size must be at least 1")]
    EmptyPool,
    #[error("worker ports would exceed the valid port range (listener.port {port} + pool.size {size})")]
    PortRange { port: u16, size: usize },
    #[error("observability.metrics_address is not a valid socket address: {0}")]
    MetricsAddress(String),
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.pool.size == 0 {
        errors.push(ValidationError::EmptyPool);
    }

    // Highest derived worker port is listener.port + 1 + (size - 1).
    if config.pool.size > 0
        && (config.listener.port as usize + config.pool.size) > u16::MAX as usize
    {
        errors.push(ValidationError::PortRange {
            port: config.listener.port,
            size: config.pool.size,
        });
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&BalancerConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_pool_rejected() {
        let mut config = BalancerConfig::default();
        config.pool.size = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::EmptyPool));
    }

    #[test]
    fn test_port_overflow_rejected() {
        let mut config = BalancerConfig::default();
        config.listener.port = 65_530;
        config.pool.size = 10;
        assert!(validate_config(&config).is_err());
    }
}
