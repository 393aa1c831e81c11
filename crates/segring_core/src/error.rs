//! Configuration error types

use std::io;
use thiserror::Error;

/// Errors that can occur when loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error when reading the file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error
    #[error("Config parsing error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Malformed color string
    #[error("Invalid color '{0}': expected #rgb, #rrggbb or #rrggbbaa")]
    InvalidColor(String),

    /// A field holds a value outside its allowed range
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
