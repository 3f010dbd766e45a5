//! Configuration error types

use thiserror::Error;

/// Reasons Quill refuses to start with the environment it was given
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable left to its development default in a production deployment
    #[error("{0} must be set explicitly when Quill runs in production")]
    RequiredInProduction(&'static str),

    /// A variable that is set but does not parse
    #[error("{name} has an unusable value: {reason}")]
    InvalidValue { name: String, reason: String },

    /// Pool sizing that the database pool would reject
    #[error("DATABASE_MIN_CONNECTIONS ({min}) exceeds DATABASE_MAX_CONNECTIONS ({max})")]
    PoolBounds { min: u32, max: u32 },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
