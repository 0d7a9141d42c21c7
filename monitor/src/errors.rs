//! Custom error types for the monitor service
//!
//! Structured errors for configuration handling and serverless function
//! calls; both convert into `anyhow::Error` at service boundaries.

use std::fmt;

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    LoadFailed { path: String, reason: String },

    /// Failed to write the configuration file back
    PersistFailed { path: String, reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// Configuration parsing error
    ParseError { reason: String },
}

/// Serverless function call error variants
#[derive(Debug)]
pub enum FunctionError {
    /// Request could not be sent
    RequestFailed { endpoint: String, reason: String },

    /// Function replied with a non-success status
    BadStatus { endpoint: String, status: u16 },

    /// Function replied with an unparseable body
    InvalidResponse { endpoint: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::PersistFailed { path, reason } => {
                write!(f, "Failed to write config to '{}': {}", path, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }
        }
    }
}

impl fmt::Display for FunctionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionError::RequestFailed { endpoint, reason } => {
                write!(f, "Request to {} failed: {}", endpoint, reason)
            }
            FunctionError::BadStatus { endpoint, status } => {
                write!(f, "{} returned status {}", endpoint, status)
            }
            FunctionError::InvalidResponse { endpoint, reason } => {
                write!(f, "Invalid response from {}: {}", endpoint, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for FunctionError {}
