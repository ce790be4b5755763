use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "worker_count must be at least 1".to_string(),
        });
    }

    if config.batch_concurrency == 0 {
        return Err(ConfigError::Validation {
            message: "batch_concurrency must be at least 1".to_string(),
        });
    }

    if config.cache_directory == config.artifact_directory {
        return Err(ConfigError::Validation {
            message: "cache_directory and artifact_directory must differ".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_valid_config() {
        let config_json = r#"
        {
            "version": "1.0",
            "cache_directory": "/var/ifcpipe/tables",
            "artifact_directory": "/var/ifcpipe/artifacts",
            "worker_count": 4,
            "queue_capacity": 16
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.cache_directory, "/var/ifcpipe/tables");
        assert_eq!(config.artifact_directory, "/var/ifcpipe/artifacts");
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.effective_queue_capacity(), 16);
        assert_eq!(config.batch_concurrency, 5);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load_config_from_str(r#"{ "version": "1.0" }"#).unwrap();
        assert!(!config.cache_directory.is_empty());
        assert_ne!(config.cache_directory, config.artifact_directory);
        assert_eq!(config.memory_cache_capacity, 64);
    }

    #[test]
    fn test_invalid_version() {
        let result = load_config_from_str(r#"{ "version": "2.0" }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = load_config_from_str(r#"{ "version": "1.0", "input_directory": "/in" }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_zero_workers_rejected_by_schema() {
        let result = load_config_from_str(r#"{ "version": "1.0", "worker_count": 0 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_same_directories_rejected() {
        let result = load_config_from_str(
            r#"{ "version": "1.0", "cache_directory": "/x", "artifact_directory": "/x" }"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/ifcpipe.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }
}
