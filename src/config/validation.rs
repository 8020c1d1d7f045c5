//! Configuration validation
//!
//! Validates wikijson configuration for correctness:
//! - Timestamp keys get a usable namespace
//! - The snapshot directory is a directory
//! - The wikis database and the timestamp store are different files

use super::wikijson_config::WikiJsonConfig;
use crate::WikiJsonError;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a wikijson configuration, collecting every problem
pub fn validate_config(config: &WikiJsonConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.cache_namespace.trim().is_empty() {
        errors.push(ValidationError::new(
            "cache_namespace",
            "Namespace cannot be empty",
        ));
    } else if config.cache_namespace.contains(':') {
        // ':' separates the key segments
        errors.push(ValidationError::new(
            "cache_namespace",
            format!(
                "Namespace '{}' must not contain ':'",
                config.cache_namespace
            ),
        ));
    }

    if config.cache_directory.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "cache_directory",
            "Cache directory cannot be empty",
        ));
    } else if config.cache_directory.exists() && !config.cache_directory.is_dir() {
        errors.push(ValidationError::new(
            "cache_directory",
            format!(
                "{} exists but is not a directory",
                config.cache_directory.display()
            ),
        ));
    }

    if config.database == config.timestamp_store {
        errors.push(ValidationError::new(
            "timestamp_store",
            "Timestamp store must not be the wikis database",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate configuration and return a Result
pub fn validate_config_result(config: &WikiJsonConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        WikiJsonError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_valid_config() {
        let config = WikiJsonConfig::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_namespace() {
        let mut config = WikiJsonConfig::new();
        config.cache_namespace = "  ".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "cache_namespace");
    }

    #[test]
    fn test_namespace_with_separator() {
        let mut config = WikiJsonConfig::new();
        config.cache_namespace = "farm:one".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].message.contains("':'"));
    }

    #[test]
    fn test_cache_directory_is_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut config = WikiJsonConfig::new();
        config.cache_directory = temp_file.path().to_path_buf();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].message.contains("not a directory"));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = WikiJsonConfig::new();
        config.cache_namespace = String::new();
        config.timestamp_store = config.database.clone();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);

        let err = validate_config_result(&config).unwrap_err();
        assert!(err.to_string().contains("timestamp_store"));
    }
}
