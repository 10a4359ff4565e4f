//! Error types for tracker-fetch
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for tracker-fetch
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Transport / HTTP Errors
    // ============================================================================
    #[error("Transport failure: {message}")]
    Transport { message: String, timeout: bool },

    #[error("Rate limited (429), retry after {retry_after_seconds:?}s: {body}")]
    RateLimited {
        retry_after_seconds: Option<u64>,
        body: String,
    },

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Client error {status}: {body}")]
    ClientError { status: u16, body: String },

    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetryExhausted { attempts: u32, last: Box<Error> },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Fetch cancelled")]
    Cancelled,

    // ============================================================================
    // Pagination / Data Errors
    // ============================================================================
    #[error("Malformed continuation: {message}")]
    MalformedContinuation { message: String },

    #[error("Failed to decode page: {message}")]
    Decode { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timeout: false,
        }
    }

    /// Create a transport timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timeout: true,
        }
    }

    /// Classify a non-success HTTP status into the matching error kind
    pub fn from_status(
        status: u16,
        retry_after_seconds: Option<u64>,
        body: impl Into<String>,
    ) -> Self {
        let body = body.into();
        match status {
            429 => Self::RateLimited {
                retry_after_seconds,
                body,
            },
            500..=599 => Self::ServerError { status, body },
            _ => Self::ClientError { status, body },
        }
    }

    /// Create a malformed continuation error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedContinuation {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. } | Error::RateLimited { .. } | Error::ServerError { .. }
        )
    }

    /// Whether the skip-and-continue policy may record this error and move on.
    ///
    /// Cancellation and broken pagination metadata always abort.
    pub fn is_skippable(&self) -> bool {
        !matches!(
            self,
            Error::Cancelled | Error::MalformedContinuation { .. } | Error::Config { .. }
        )
    }

    /// HTTP status carried by this error, looking through `RetryExhausted`
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RateLimited { .. } => Some(429),
            Error::ServerError { status, .. } | Error::ClientError { status, .. } => Some(*status),
            Error::RetryExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Response body carried by this error, looking through `RetryExhausted`
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::RateLimited { body, .. }
            | Error::ServerError { body, .. }
            | Error::ClientError { body, .. } => Some(body),
            Error::RetryExhausted { last, .. } => last.body(),
            _ => None,
        }
    }
}

/// Result type alias for tracker-fetch
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
