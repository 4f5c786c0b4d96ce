//! Error types for rsapi-auth
//!
//! Every authenticator, the transport and the configuration loaders return
//! `Result<T, Error>`. Nothing is retried: an error surfaces to the caller of
//! the operation that hit it.

use thiserror::Error;

/// The main error type for rsapi-auth
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

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timed out after {timeout_ms}ms waiting for response headers")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Failed to rebuild response: {0}")]
    HttpResponse(#[from] http::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: HTTP {status}: {body}")]
    AuthFailed { status: u16, body: String },

    #[error("Unexpected auth response: {message}")]
    Protocol { message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid Location header '{location}': {message}")]
    Redirect { location: String, message: String },
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

    /// Create an authentication failure from a status and response body
    pub fn auth_failed(status: u16, body: impl Into<String>) -> Self {
        Self::AuthFailed {
            status,
            body: body.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a redirect error
    pub fn redirect(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
            message: message.into(),
        }
    }

    /// HTTP status carried by an authentication failure
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::AuthFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error came from reaching (or waiting on) the remote endpoint
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Timeout { .. })
    }
}

/// Result type alias for rsapi-auth
pub type Result<T> = std::result::Result<T, Error>;
