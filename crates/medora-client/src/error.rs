//! # Client Error Types
//!
//! Error types for session and API operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Session     │  │   Transport     │  │      Local              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Authentication │  │  Network        │  │  Config                 │ │
//! │  │  Registration   │  │  Api{status}    │  │  Storage                │ │
//! │  │  TokenRefresh   │  │                 │  │  Serialization          │ │
//! │  │  NotAuthenticated│ │                 │  │  InvalidState           │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  From medora-core: Core, Validation, Form                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Screens show [`ClientError::user_message`] in their alert banner.

use medora_core::{CoreError, FieldErrors, ValidationError};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Fallback shown when a failed login carries no server message.
pub const LOGIN_FALLBACK: &str = "An unexpected error occurred during login.";

/// Fallback shown when a failed signup carries no server message.
pub const SIGNUP_FALLBACK: &str = "An unexpected error occurred during signup.";

/// Fallback for every other failed request.
pub const GENERIC_FALLBACK: &str = "An unexpected error occurred.";

/// Client error type covering every failure a screen can see.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Session Errors
    // =========================================================================
    /// Login was rejected by the server.
    #[error("Login failed: {message}")]
    Authentication { message: String },

    /// Signup was rejected by the server.
    #[error("Signup failed: {message}")]
    Registration { message: String },

    /// The refresh token could not be exchanged for a new access token.
    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    /// The operation needs a session and there is none.
    #[error("Not signed in")]
    NotAuthenticated,

    /// The session state machine rejected the operation.
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request never produced an HTTP response.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The server answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Configuration could not be loaded, saved or validated.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The persisted session could not be read or written.
    #[error("Session storage error: {0}")]
    Storage(String),

    /// A body could not be encoded or decoded.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Form(#[from] FieldErrors),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Serialization(err.to_string())
        } else {
            ClientError::Network {
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Config(format!("Invalid URL: {}", err))
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Builds an `Api` error from a status and the raw response body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        ClientError::Api {
            status: status.as_u16(),
            message: ErrorBody::parse(body)
                .message()
                .unwrap_or(GENERIC_FALLBACK)
                .to_string(),
        }
    }

    /// Returns true for a 401 response.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Api { status: 401, .. })
    }

    /// Text for the screen's alert banner.
    ///
    /// Server-provided messages are shown verbatim; local failures get a
    /// generic sentence.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Authentication { message }
            | ClientError::Registration { message }
            | ClientError::Api { message, .. } => message.clone(),
            ClientError::Network { .. } => GENERIC_FALLBACK.to_string(),
            ClientError::TokenRefresh { .. } | ClientError::NotAuthenticated => {
                "Your session has expired. Please sign in again.".to_string()
            }
            ClientError::Validation(e) => e.to_string(),
            ClientError::Form(errors) => errors
                .errors()
                .first()
                .map(ToString::to_string)
                .unwrap_or_else(|| GENERIC_FALLBACK.to_string()),
            ClientError::Core(CoreError::Validation(e)) => e.to_string(),
            ClientError::Core(_)
            | ClientError::InvalidState(_)
            | ClientError::Config(_)
            | ClientError::Storage(_)
            | ClientError::Serialization(_) => GENERIC_FALLBACK.to_string(),
        }
    }
}

// =============================================================================
// Server Error Body
// =============================================================================

/// Error payload shapes the API is known to send.
///
/// ```json
/// { "message": "Invalid credentials" }
/// { "error": { "message": "Email already registered" } }
/// ```
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<NestedError>,
}

#[derive(Debug, Deserialize)]
struct NestedError {
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    /// Parses a body, treating anything unparseable as empty.
    pub(crate) fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// Top-level `message`.
    pub(crate) fn top_message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }

    /// `error.message`.
    pub(crate) fn nested_message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .filter(|m| !m.is_empty())
    }

    /// `error.message`, falling back to `message`.
    pub(crate) fn message(&self) -> Option<&str> {
        self.nested_message().or_else(|| self.top_message())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
