//! Error types shared by every connector.

use std::time::Duration;

/// Result type alias for connector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for connector operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// The broad class this error falls into.
    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    /// The connector error this one wraps, if any.
    ///
    /// Fail-closed content-type errors keep the status-based error here.
    pub fn source_error(&self) -> Option<&Error> {
        self.source.as_ref()?.downcast_ref::<Error>()
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable() || self.source_error().is_some_and(Error::is_retryable)
    }

    /// Returns true if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind, ErrorKind::RateLimited { .. })
    }

    /// Returns true if the operation was cancelled by the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// Returns the retry-after duration if this is a rate limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match &self.kind {
            ErrorKind::RateLimited { retry_after, .. } => *retry_after,
            _ => self.source_error().and_then(Error::retry_after),
        }
    }

    /// HTTP status carried by the error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::AccessToken(_) => Some(401),
            ErrorKind::Forbidden(_) => Some(403),
            ErrorKind::NotFound(_) => Some(404),
            ErrorKind::RateLimited { .. } => Some(429),
            ErrorKind::Caller { status, .. }
            | ErrorKind::Server { status, .. }
            | ErrorKind::UnexpectedStatus { status, .. } => Some(*status),
            _ => self.source_error().and_then(Error::status),
        }
    }
}

/// Coarse classification of errors, used by callers to decide what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network failure or timeout. Retryable.
    Transport,
    /// Content-type or decoding mismatch. The provider answered in an unexpected shape.
    Protocol,
    /// The request was wrong (4xx, bad input). Fix the request.
    Caller,
    /// The provider failed (5xx). Retryable with backoff.
    Server,
    /// The provider's data contract changed or a programming error occurred.
    DataIntegrity,
    /// The caller cancelled the operation.
    Cancelled,
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request timeout.
    #[error("Request timeout")]
    Timeout,

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// The Content-Type header could not be parsed.
    #[error("Failed to parse content type: {0}")]
    InvalidContentType(String),

    /// The response declared a media type other than the one expected.
    #[error("Unexpected content type: expected {expected}, got {actual}")]
    UnexpectedContentType { expected: String, actual: String },

    /// An error response carried no Content-Type, so it cannot be interpreted.
    #[error("Missing content type in error response")]
    MissingContentType,

    /// The body could not be decoded into a document.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A document node had a different type than requested.
    #[error("Invalid type: expected {expected}, got {actual}")]
    InvalidType { expected: String, actual: String },

    /// A required key or column was absent.
    #[error("Key not found: '{0}'")]
    KeyNotFound(String),

    /// A structured body was required but the response had none.
    #[error("Empty response body")]
    EmptyResponse,

    /// Authentication error (HTTP 401).
    #[error("Access token invalid: {0}")]
    AccessToken(String),

    /// Authorization error (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limited{}", retry_after.map(|d| format!(", retry after {:?}", d)).unwrap_or_default())]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },

    /// Any other 4xx response.
    #[error("Caller error: {status} {message}")]
    Caller { status: u16, message: String },

    /// A 5xx response.
    #[error("Server error: {status} {message}")]
    Server { status: u16, message: String },

    /// A non-2xx status outside the 4xx/5xx ranges.
    #[error("Unexpected status: {status} {message}")]
    UnexpectedStatus { status: u16, message: String },

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ErrorKind {
    /// The broad class of this error kind.
    pub fn class(&self) -> ErrorClass {
        match self {
            ErrorKind::Connection(_) | ErrorKind::Timeout => ErrorClass::Transport,
            ErrorKind::Cancelled => ErrorClass::Cancelled,
            ErrorKind::InvalidContentType(_)
            | ErrorKind::UnexpectedContentType { .. }
            | ErrorKind::MissingContentType
            | ErrorKind::Decode(_)
            | ErrorKind::EmptyResponse => ErrorClass::Protocol,
            ErrorKind::InvalidType { .. } | ErrorKind::KeyNotFound(_) => ErrorClass::DataIntegrity,
            ErrorKind::AccessToken(_)
            | ErrorKind::Forbidden(_)
            | ErrorKind::NotFound(_)
            | ErrorKind::RateLimited { .. }
            | ErrorKind::Caller { .. }
            | ErrorKind::UnexpectedStatus { .. }
            | ErrorKind::InvalidUrl(_)
            | ErrorKind::Config(_) => ErrorClass::Caller,
            ErrorKind::Server { .. } => ErrorClass::Server,
            ErrorKind::Other(_) => ErrorClass::DataIntegrity,
        }
    }

    /// Returns true if this error kind is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::RateLimited { .. } => true,
            ErrorKind::Timeout => true,
            ErrorKind::Connection(_) => true,
            ErrorKind::Server { .. } => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() || err.is_request() || err.is_body() {
            ErrorKind::Connection(err.to_string())
        } else if err.is_redirect() {
            ErrorKind::Connection(err.to_string())
        } else if err.is_decode() {
            ErrorKind::Decode(err.to_string())
        } else if err.is_builder() {
            ErrorKind::InvalidUrl(err.to_string())
        } else {
            ErrorKind::Other(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Decode(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidUrl(err.to_string()), err)
    }
}
