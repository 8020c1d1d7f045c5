//! Error types for wikijson
//!
//! One enum covers every failure mode. Only a few of them ever reach the
//! caller of [`WikiJson::update`](crate::WikiJson::update): snapshot write
//! failures and timestamp store read failures are logged and absorbed.

use thiserror::Error;

/// Result type alias for wikijson operations
pub type Result<T> = std::result::Result<T, WikiJsonError>;

#[derive(Error, Debug)]
pub enum WikiJsonError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The wiki has no row in the wikis table
    #[error("Wiki not found: {0}")]
    WikiNotFound(String),

    /// The wiki id cannot be used as a snapshot file name or cache key
    #[error("Invalid wiki id: {0:?}")]
    InvalidWikiId(String),

    /// An extension tried to write over a core snapshot field
    #[error("Field {0:?} is reserved for core snapshot data")]
    ReservedField(String),

    /// The registered JSON builder hook failed
    #[error("Extension error: {0}")]
    Extension(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl WikiJsonError {
    /// True for the missing-wiki condition raised by single wiki regeneration
    pub fn is_not_found(&self) -> bool {
        matches!(self, WikiJsonError::WikiNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = WikiJsonError::WikiNotFound("testwiki".to_string());
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Wiki not found: testwiki");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: WikiJsonError = io.into();
        assert!(matches!(err, WikiJsonError::Io(_)));
        assert!(!err.is_not_found());
    }
}
