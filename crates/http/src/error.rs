//! Error handling for the bookshelf HTTP layer

use serde_json::Value;
use thiserror::Error;

/// Failures of a single backend call
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend answered with a non-success status
    #[error("{}", status_message(.status, .message))]
    Status {
        status: u16,
        /// `message` field of the error body, when one was sent
        message: Option<String>,
    },

    /// No response was received; the transport detail is logged, not displayed
    #[error("network error: the backend could not be reached")]
    Network(String),

    /// A success response whose body could not be decoded
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The request could not be built
    #[error("invalid request: {0}")]
    Request(String),
}

impl ApiError {
    /// Create a status error from a raw response body
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        Self::Status {
            status,
            message: extract_message(body),
        }
    }

    /// HTTP status, absent for failures that never produced a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message supplied by the backend, if any
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            ApiError::Request(e.to_string())
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

fn status_message(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("API error: {}", status),
    }
}

/// Malformed bodies and bodies without a usable `message` look the same.
fn extract_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}
