//! Error types for Dynalock
//!
//! Lock contention is never an error: a failed write condition is reported as a
//! normal outcome by the store layer. These variants cover infrastructure and
//! configuration failures only.

/// Dynalock error type
#[derive(thiserror::Error, Debug)]
pub enum DynalockError {
    #[error("table '{0}' not found")]
    TableNotFound(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DynalockError {
    /// Create a store error from any displayable cause
    pub fn store(message: impl std::fmt::Display) -> Self {
        Self::Store(message.to_string())
    }
}

impl From<config::ConfigError> for DynalockError {
    fn from(value: config::ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DynalockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DynalockError::TableNotFound("dynamo_locks".to_string());
        assert_eq!(err.to_string(), "table 'dynamo_locks' not found");

        let err = DynalockError::store("throttled");
        assert_eq!(err.to_string(), "store error: throttled");

        let err = DynalockError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "store unavailable: connection refused");
    }

    #[test]
    fn test_from_config_error() {
        let err: DynalockError = config::ConfigError::NotFound("key".to_string()).into();
        assert!(matches!(err, DynalockError::Config(_)));
    }
}
