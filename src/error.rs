//! Failures surfaced to the caller of a catalog or session operation.
//!
//! Every variant renders as a single human-readable message; none of them is
//! fatal, and each operation can simply be invoked again.

use bookshelf_authz::AuthzError;
use bookshelf_http::ApiError;
use serde::Serialize;
use thiserror::Error;

/// A required field that failed client-side validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub error: &'static str,
}

impl FieldError {
    pub fn required(field: &'static str) -> Self {
        Self {
            field,
            error: "required",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Sign-in or sign-up was rejected; no token was stored
    #[error("{message}")]
    Auth { message: String },

    /// A resource call failed, either with a status or without a response
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Submission blocked before any network call
    #[error("{message}")]
    Validation {
        details: Vec<FieldError>,
        message: String,
    },

    #[error(transparent)]
    Credentials(#[from] AuthzError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(details: Vec<FieldError>, message: impl Into<String>) -> Self {
        Self::Validation {
            details,
            message: message.into(),
        }
    }

    /// Validation error listing every missing field, or `Ok` when none are missing
    pub fn check_required(missing: Vec<FieldError>) -> Result<(), Self> {
        if missing.is_empty() {
            return Ok(());
        }
        let fields: Vec<_> = missing.iter().map(|f| f.field).collect();
        let message = format!("missing required fields: {}", fields.join(", "));
        Err(Self::validation(missing, message))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation { .. })
    }

    /// HTTP status of the failed call, when there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Api(e) => e.status(),
            _ => None,
        }
    }
}
