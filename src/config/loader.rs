//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::BalancerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("PORT environment variable is not a valid port: {0}")]
    PortEnv(String),
    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: TOML file if given, defaults otherwise, then the
/// `PORT` environment override, then semantic validation.
pub fn load_config(path: Option<&Path>) -> Result<BalancerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => BalancerConfig::default(),
    };

    if let Ok(port) = std::env::var("PORT") {
        config.listener.port = port
            .parse()
            .map_err(|_| ConfigError::PortEnv(port.clone()))?;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml() {
        let config: BalancerConfig = toml::from_str(
            r#"
            [listener]
            port = 5000

            [pool]
            size = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.port, 5000);
        assert_eq!(config.pool.size, 3);
        // Untouched sections fall back to defaults.
        assert_eq!(config.pool.drain_timeout_secs, 5);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: BalancerConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.port, 4000);
    }

    // Serializes the tests that touch the PORT environment variable; the
    // test harness runs #[test] functions in parallel threads.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn test_port_env_overrides_listener_port() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("PORT", "6100");
        let result = load_config(None);
        std::env::remove_var("PORT");
        assert_eq!(result.unwrap().listener.port, 6100);
    }

    #[test]
    fn test_port_env_rejects_non_numeric_value() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("PORT", "not-a-port");
        let result = load_config(None);
        std::env::remove_var("PORT");
        assert!(matches!(result, Err(ConfigError::PortEnv(v)) if v == "not-a-port"));
    }
}
