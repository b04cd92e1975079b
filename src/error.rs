//! Error types for the Ringo bridge
//!
//! Every failure raised by the token manager, the request executor and the
//! vendor client is classified here. Callers above the executor never retry;
//! they only inspect the classification to translate a failure into a
//! user-facing result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Ringo operations
pub type Result<T> = std::result::Result<T, RingoError>;

/// Error types for Ringo operations
#[derive(Error, Debug)]
pub enum RingoError {
    /// Bad credentials or a failed (re)authentication
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The vendor rejected the bearer token
    #[error("Token expired: {0}")]
    TokenExpired(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Connection errors (refused, reset, DNS)
    #[error("Connection error: {0}")]
    Connection(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status returned by the vendor
    #[error("Unexpected HTTP status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected response envelope
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// Action aborted before any network call (no valid key, unknown entity)
    #[error("Policy violation: {0}")]
    Policy(String),

    /// The vendor refused a door operation
    #[error("Device control error: {0}")]
    DeviceControl(String),

    /// Invalid action parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The transport session was released
    #[error("Session closed: {0}")]
    SessionClosed(String),

    /// Every attempt of a request failed
    #[error("Request {method} {endpoint} failed after {retries} retries: {source}")]
    RetriesExhausted {
        /// HTTP method
        method: String,
        /// Relative endpoint
        endpoint: String,
        /// Number of retries performed beyond the first attempt
        retries: u32,
        /// Failure of the final attempt
        #[source]
        source: Box<RingoError>,
    },
}

/// Structured error code for machine-readable error handling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Connection errors (1000-1099)
    ConnectionTimeout,
    ConnectionLost,
    SessionClosed,

    // Authentication errors (1100-1199)
    InvalidCredentials,
    AuthenticationExpired,

    // Configuration errors (1200-1299)
    ConfigurationInvalid,

    // Lock errors (1300-1399)
    DeviceControlFailed,
    NoValidKey,

    // Data errors (1400-1499)
    ParsingFailed,
    InvalidInput,

    // Service errors (1600-1699)
    ServiceUnavailable,
    ExternalServiceError,
}

impl ErrorCode {
    /// Get numeric error code
    pub fn as_number(&self) -> u32 {
        match self {
            ErrorCode::ConnectionTimeout => 1001,
            ErrorCode::ConnectionLost => 1003,
            ErrorCode::SessionClosed => 1005,

            ErrorCode::InvalidCredentials => 1101,
            ErrorCode::AuthenticationExpired => 1102,

            ErrorCode::ConfigurationInvalid => 1202,

            ErrorCode::DeviceControlFailed => 1303,
            ErrorCode::NoValidKey => 1305,

            ErrorCode::ParsingFailed => 1401,
            ErrorCode::InvalidInput => 1402,

            ErrorCode::ServiceUnavailable => 1601,
            ErrorCode::ExternalServiceError => 1603,
        }
    }

    /// Get error category
    pub fn category(&self) -> &'static str {
        match self.as_number() {
            1000..=1099 => "connection",
            1100..=1199 => "authentication",
            1200..=1299 => "configuration",
            1300..=1399 => "lock",
            1400..=1499 => "data",
            1600..=1699 => "service",
            _ => "unknown",
        }
    }
}

impl RingoError {
    /// Create an authentication error
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        RingoError::Authentication(msg.into())
    }

    /// Create a token expired error
    pub fn token_expired<S: Into<String>>(msg: S) -> Self {
        RingoError::TokenExpired(msg.into())
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        RingoError::Timeout(msg.into())
    }

    /// Create a connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        RingoError::Connection(msg.into())
    }

    /// Create a status error, keeping at most 256 bytes of the body
    pub fn status<S: Into<String>>(status: u16, body: S) -> Self {
        let mut body = body.into();
        if body.len() > 256 {
            let mut cut = 256;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        RingoError::Status { status, body }
    }

    /// Create a parsing error
    pub fn parsing<S: Into<String>>(msg: S) -> Self {
        RingoError::Parsing(msg.into())
    }

    /// Create a policy error
    pub fn policy<S: Into<String>>(msg: S) -> Self {
        RingoError::Policy(msg.into())
    }

    /// Create a device control error
    pub fn device_control<S: Into<String>>(msg: S) -> Self {
        RingoError::DeviceControl(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        RingoError::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        RingoError::Config(msg.into())
    }

    /// Create a session closed error
    pub fn session_closed<S: Into<String>>(msg: S) -> Self {
        RingoError::SessionClosed(msg.into())
    }

    /// Classify a transport error raised by reqwest
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RingoError::timeout(format!("HTTP request timed out: {err}"))
        } else if err.is_connect() {
            RingoError::connection(format!("HTTP connection failed: {err}"))
        } else {
            RingoError::Http(err)
        }
    }

    /// Map this error to its structured code
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            RingoError::Authentication(_) => ErrorCode::InvalidCredentials,
            RingoError::TokenExpired(_) => ErrorCode::AuthenticationExpired,
            RingoError::Timeout(_) => ErrorCode::ConnectionTimeout,
            RingoError::Connection(_) | RingoError::Http(_) => ErrorCode::ConnectionLost,
            RingoError::Status { status, .. } if *status >= 500 => ErrorCode::ServiceUnavailable,
            RingoError::Status { .. } => ErrorCode::ExternalServiceError,
            RingoError::Json(_) | RingoError::Parsing(_) => ErrorCode::ParsingFailed,
            RingoError::Policy(_) => ErrorCode::NoValidKey,
            RingoError::DeviceControl(_) => ErrorCode::DeviceControlFailed,
            RingoError::InvalidInput(_) => ErrorCode::InvalidInput,
            RingoError::Config(_) => ErrorCode::ConfigurationInvalid,
            RingoError::SessionClosed(_) => ErrorCode::SessionClosed,
            RingoError::RetriesExhausted { source, .. } => source.to_error_code(),
        }
    }

    /// Check if error is retryable by the executor
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RingoError::TokenExpired(_)
                | RingoError::Timeout(_)
                | RingoError::Connection(_)
                | RingoError::Http(_)
                | RingoError::Status { .. }
        )
    }

    /// Check if error indicates authentication issue
    pub fn is_auth_error(&self) -> bool {
        match self {
            RingoError::Authentication(_) | RingoError::TokenExpired(_) => true,
            RingoError::RetriesExhausted { source, .. } => source.is_auth_error(),
            _ => false,
        }
    }

    /// Get a production-safe error message that doesn't expose sensitive information
    pub fn sanitized_message(&self) -> String {
        #[cfg(debug_assertions)]
        {
            self.to_string()
        }
        #[cfg(not(debug_assertions))]
        {
            match self {
                RingoError::Authentication(_) => "Authentication failed".to_string(),
                RingoError::TokenExpired(_) => "Authentication expired".to_string(),
                RingoError::Timeout(_) => "Operation timed out".to_string(),
                RingoError::Connection(_) => "Network connection issue".to_string(),
                RingoError::Http(_) => "HTTP request failed".to_string(),
                RingoError::Status { status, .. } => format!("Vendor returned HTTP {status}"),
                RingoError::Json(_) | RingoError::Parsing(_) => "Data parsing error".to_string(),
                RingoError::Policy(msg) => msg.clone(),
                RingoError::DeviceControl(_) => "Door operation failed".to_string(),
                RingoError::InvalidInput(msg) => format!("Invalid input: {msg}"),
                RingoError::Config(_) => "Configuration error".to_string(),
                RingoError::SessionClosed(_) => "Connection closed".to_string(),
                RingoError::RetriesExhausted { retries, .. } => {
                    format!("Request failed after {retries} retries")
                }
            }
        }
    }
}
