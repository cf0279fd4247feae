use serde::Deserialize;
use thiserror::Error;

/// Fallback message when an error response carries no `message` field.
pub const DEFAULT_ERROR_MESSAGE: &str = "API request failed";

/// Message for requests that never received a response.
pub const NO_CONNECTIVITY_MESSAGE: &str = "No response from server. Check your connection.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 401 from the server. The stored bearer token has already been removed.
    #[error("{0}")]
    Unauthorized(String),

    /// Wrong credentials or code.
    #[error("{0}")]
    Rejected(String),

    #[error("No response from server. Check your connection.")]
    NoConnectivity,

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Unexpected(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Server-provided `message` from an error body, if it has one.
    fn server_message(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::server_message(body).unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            code => ApiError::Server {
                status: code,
                message,
            },
        }
    }

    /// Whether a query may be retried after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::NoConnectivity => true,
            ApiError::Server { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the session is no longer valid and the user must sign in again.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}
