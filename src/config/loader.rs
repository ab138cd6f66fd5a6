//! Configuration loading from disk.

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
    Toml(#[from] toml::de::Error),
    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML or JSON file.
///
/// The format is picked from the extension; anything but `.json` is TOML.
pub fn load_config(path: &Path) -> Result<BalancerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config = if is_json {
        parse_json(&content)?
    } else {
        parse_toml(&content)?
    };

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

pub fn parse_toml(content: &str) -> Result<BalancerConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

pub fn parse_json(content: &str) -> Result<BalancerConfig, ConfigError> {
    Ok(serde_json::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use crate::config::BalancingPolicy;

    #[test]
    fn test_parse_toml() {
        let config = parse_toml(
            r#"
            [listener]
            bind_address = "127.0.0.1:8000"

            [balancing]
            policy = "weighted"

            [retries]
            retry_limit = 2

            [[backends]]
            url = "http://127.0.0.1:3001"
            host = "one"

            [[backends]]
            url = "http://127.0.0.1:3002"
            weight = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.backends[0].host.as_deref(), Some("one"));
        assert_eq!(config.backends[1].weight, 4);
        assert_eq!(config.balancing.policy, BalancingPolicy::Weighted);
        assert_eq!(config.retries.retry_limit, 2);
        assert_eq!(config.retries.attempt_limit, 3);
    }

    #[test]
    fn test_parse_json_backend_alias() {
        let config = parse_json(
            r#"{ "backend": [ { "host": "a", "url": "http://127.0.0.1:3001" } ] }"#,
        )
        .unwrap();
        assert_eq!(config.backends.len(), 1);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
    }

    #[test]
    fn test_load_config_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "backends": [ {{ "url": "http://127.0.0.1:3001" }} ] }}"#).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.backends[0].url, "http://127.0.0.1:3001");
    }

    #[test]
    fn test_load_config_reports_validation_errors() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[retries]\nattempt_limit = 0").unwrap();

        let err = load_config(file.path()).unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
