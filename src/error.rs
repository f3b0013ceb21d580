// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for hashcsp
//!
//! Discovery is best-effort: per-file and per-element failures are logged and
//! skipped, so most of these variants only surface when a whole operation
//! cannot start (unreadable policy file, browser that will not launch).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for hashcsp operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for hashcsp
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request failed (lightweight engine)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTML parsing failed
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// URL without an http(s) scheme
    #[error("Invalid URL '{url}': URLs must start with 'http://' or 'https://'. Did you mean '{suggestion}'?")]
    InvalidUrl { url: String, suggestion: String },

    /// Scan root missing or not a directory
    #[error("Directory {} does not exist or is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Browser launch or driver failure
    #[error("Browser error: {0}")]
    Browser(String),

    /// Navigation failed
    #[error("Navigation failed to {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// Timeout error
    #[error("Operation timed out after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    /// Operation the active engine cannot perform
    #[error("Unsupported by this engine: {0}")]
    Unsupported(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a browser error
    pub fn browser<S: Into<String>>(msg: S) -> Self {
        Error::Browser(msg.into())
    }

    /// Create a navigation error
    pub fn navigation(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Navigation {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration_ms,
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create an HTML parse error
    pub fn html<S: Into<String>>(msg: S) -> Self {
        Error::HtmlParse(msg.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Check if a navigation retry may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Timeout { .. } | Error::Navigation { .. } | Error::Http(_)
        )
    }

    /// Log code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            Error::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                ErrorCode::PermissionDenied
            }
            Error::Io(_) => ErrorCode::FileIoError,
            Error::NotADirectory(_) => ErrorCode::FileNotFound,
            Error::Serialization(_) => ErrorCode::InvalidJson,
            Error::HtmlParse(_) => ErrorCode::FileProcessingError,
            Error::Url(_) | Error::InvalidUrl { .. } | Error::Config(_) => {
                ErrorCode::ValidationError
            }
            Error::Http(_) | Error::Navigation { .. } => ErrorCode::NetworkError,
            Error::Timeout { .. } => ErrorCode::ConnectionTimeout,
            Error::Browser(_) | Error::Unsupported(_) => ErrorCode::BrowserError,
            Error::Other(_) => ErrorCode::Unknown,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

/// Stable codes attached to log events as the `error_code` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    FileNotFound,
    PermissionDenied,
    InvalidEncoding,
    FileProcessingError,
    FileIoError,
    InvalidJson,
    ValidationError,
    InvalidCsp,
    UnsafeDirective,
    NetworkError,
    ConnectionTimeout,
    BrowserError,
    HashComputationError,
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FileNotFound => "FILE_NOT_FOUND",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::InvalidEncoding => "INVALID_ENCODING",
            ErrorCode::FileProcessingError => "FILE_PROCESSING_ERROR",
            ErrorCode::FileIoError => "FILE_IO_ERROR",
            ErrorCode::InvalidJson => "INVALID_JSON",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InvalidCsp => "INVALID_CSP",
            ErrorCode::UnsafeDirective => "UNSAFE_DIRECTIVE",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::ConnectionTimeout => "CONNECTION_TIMEOUT",
            ErrorCode::BrowserError => "BROWSER_ERROR",
            ErrorCode::HashComputationError => "HASH_COMPUTATION_ERROR",
            ErrorCode::Unknown => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Prefix the error message with `msg`
    fn context(self, msg: &str) -> Result<T>;

    /// Wrap any failure as a browser error
    fn browser_context(self, operation: &str) -> Result<T>;
}

impl<T, E: fmt::Display> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| Error::Other(format!("{}: {}", msg, e)))
    }

    fn browser_context(self, operation: &str) -> Result<T> {
        self.map_err(|e| Error::Browser(format!("{}: {}", operation, e)))
    }
}
