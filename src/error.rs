//! Centralized error types for leadsift.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the leadsift library.
#[derive(Error, Debug)]
pub enum LeadError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The message could not be decoded as RFC 5322 / MIME.
    #[error("MIME decoding error: {0}")]
    Mime(String),

    /// IMAP protocol or server error.
    #[error("IMAP error: {0}")]
    Imap(String),

    /// TLS handshake or stream error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The mailbox rejected our credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A mailbox operation did not finish in time.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Invalid or incomplete configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The lead store file is unreadable or corrupt.
    #[error("Lead store error in '{path}': {reason}")]
    Store { path: PathBuf, reason: String },

    /// No lead with the given id exists in the store.
    #[error("Lead not found: {0}")]
    LeadNotFound(String),

    /// A value could not be parsed (status, priority, source, sort key...).
    #[error("Invalid {kind} '{value}'")]
    InvalidValue { kind: &'static str, value: String },

    /// An export operation failed.
    #[error("Export error: {0}")]
    Export(String),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for `Result<T, LeadError>`.
pub type Result<T> = std::result::Result<T, LeadError>;

impl LeadError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Map an `io::Error` on `path`, turning `NotFound` into [`LeadError::FileNotFound`].
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path)
        } else {
            Self::Io { path, source }
        }
    }

    pub(crate) fn invalid(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            kind,
            value: value.into(),
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `LeadError::io`).
impl From<std::io::Error> for LeadError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}

impl From<async_native_tls::Error> for LeadError {
    fn from(err: async_native_tls::Error) -> Self {
        LeadError::Tls(err.to_string())
    }
}
