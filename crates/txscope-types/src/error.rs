use thiserror::Error;

/// Errors raised while reading configuration files or property values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("unsupported value for '{key}': {message}")]
    UnsupportedValue { key: String, message: String },

    #[error("invalid value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("duplicate persistence unit '{0}'")]
    DuplicateUnit(String),
}

/// Fatal errors from plugin initialization. Startup aborts on any of these.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("persistence unit not specified in config for plugin '{plugin}'")]
    MissingPersistenceUnit { plugin: String },

    #[error("persistence unit '{0}' is not declared")]
    UnknownPersistenceUnit(String),

    #[error("persistence unit '{0}' has no connection url")]
    MissingUrl(String),

    #[error("unsupported driver '{0}' (only 'sqlite' is available)")]
    UnsupportedDriver(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to create session factory: {0}")]
    Factory(String),
}

/// Errors from session and transaction operations.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("no unit of work is bound to this request")]
    NoActiveSession,

    #[error("no active transaction")]
    NoActiveTransaction,

    #[error("the session is already borrowed by this request")]
    SessionBusy,

    #[error("a transaction is already active")]
    TransactionAlreadyActive,

    #[error("transaction is marked rollback-only")]
    RollbackOnly,

    #[error("database connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_persistence_unit_display() {
        let err = InitError::MissingPersistenceUnit {
            plugin: "jpa".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "persistence unit not specified in config for plugin 'jpa'"
        );
    }

    #[test]
    fn test_config_error_converts_into_init_error() {
        let err: InitError = ConfigError::InvalidValue {
            key: "plugin.jpa.config.rollbackOnError".to_string(),
            value: "maybe".to_string(),
        }
        .into();
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_persistence_error_display() {
        let err = PersistenceError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
