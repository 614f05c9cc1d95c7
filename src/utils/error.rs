//! Error types for the info exporter

use std::io;
use thiserror::Error;

/// Top-level exporter error
#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Admin error: {0}")]
    Admin(#[from] AdminError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Connection-related errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to connect to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        source: io::Error,
    },

    #[error("TLS handshake failed: {0}")]
    TlsFailed(String),

    #[error("Connection closed unexpectedly")]
    Closed,

    #[error("Connection timeout after {0}ms")]
    Timeout(u64),

    #[error("Request failed: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid info response: {0}")]
    Protocol(#[from] ProtocolError),
}

impl ConnectionError {
    /// Classify an IO error raised mid-request
    pub fn from_request(e: io::Error, timeout_ms: u64) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                ConnectionError::Timeout(timeout_ms)
            }
            io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset => {
                ConnectionError::Closed
            }
            _ => ConnectionError::Io(e),
        }
    }
}

/// Info protocol framing and scanning errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Expected {expected:?}, got {actual:?}")]
    Mismatch { expected: String, actual: String },

    #[error("Unexpected end of input while looking for {0:?}")]
    UnexpectedEnd(char),

    #[error("Invalid number {0:?}")]
    InvalidNumber(String),

    #[error("Unsupported protocol version {version} / type {msg_type}")]
    UnsupportedHeader { version: u8, msg_type: u8 },

    #[error("Info response of {0} bytes exceeds limit")]
    TooLarge(u64),

    #[error("Bucket count mismatch for {key}: {labels} labels, {values} values")]
    BucketMismatch {
        key: String,
        labels: usize,
        values: usize,
    },
}

/// Value coercion errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Invalid value {0:?}: not numeric or boolean")]
    InvalidValue(String),
}

/// Startup configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid pattern {pattern:?} for {context}: {reason}")]
    InvalidPattern {
        context: String,
        pattern: String,
        reason: String,
    },

    #[error("Both {new} and legacy {legacy} are set for {context}")]
    ConflictingLists {
        context: String,
        new: &'static str,
        legacy: &'static str,
    },

    #[error("Unknown stat context {0:?}")]
    UnknownContext(String),

    #[error("Failed to read config file: {0}")]
    Read(#[from] io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("{0}")]
    Invalid(String),
}

/// Errors from the administrative user query
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdminError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Admin connection failed: {0}")]
    Connection(String),

    #[error("Admin query failed: {0}")]
    Query(String),
}

impl AdminError {
    /// Permission-class failures are never retried
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, AdminError::PermissionDenied(_))
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
