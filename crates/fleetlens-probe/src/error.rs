//! Error types for member-cluster probing.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no client registered for cluster {0}")]
    NoClient(String),

    #[error("connect to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("http handshake with {endpoint} failed: {reason}")]
    Handshake { endpoint: String, reason: String },

    #[error("request {path} failed: {reason}")]
    Request { path: String, reason: String },

    #[error("{path} returned HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },
}
