//! Error types for Synheart Energy
//!
//! Reconciliation stages never fail; absent or invalid data degrades to `None`.
//! These errors only arise at the serialization, configuration and
//! collaborator boundaries.

use thiserror::Error;

/// Errors that can occur at the engine boundary
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),
}

/// Failures reported by the external health platform.
///
/// The engine treats every variant as "no data" and logs which one it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("Permission to read health data was not granted")]
    Unauthorized,

    #[error("Health platform unavailable: {0}")]
    Unavailable(String),
}
