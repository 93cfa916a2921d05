//! Sign-in, sign-up and the token they produce.

use std::fmt;
use std::sync::Arc;

use bookshelf_authz::CredentialStore;
use bookshelf_http::{ApiClient, ApiError};
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, FieldError};

const SIGNIN_PATH: &str = "/auth/signin";
const SIGNUP_PATH: &str = "/auth/signup";

const LOGIN_FAILED: &str = "Login failed";
const SIGNUP_FAILED: &str = "Signup failed";

/// The backend answers some rejected sign-ins with a success status and this prefix.
const SIGNIN_REJECTED_PREFIX: &str = "Authentication failed";
const SIGNUP_REJECTED_PREFIX: &str = "Error:";

/// Body of both auth endpoints.
#[derive(Clone, Serialize)]
pub struct AccountCredentials {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl AccountCredentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            email: email.into(),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let mut missing = Vec::new();
        if self.username.trim().is_empty() {
            missing.push(FieldError::required("username"));
        }
        if self.email.trim().is_empty() {
            missing.push(FieldError::required("email"));
        }
        if self.password.is_empty() {
            missing.push(FieldError::required("password"));
        }
        AppError::check_required(missing)
    }
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("email", &self.email)
            .finish()
    }
}

/// Talks to the auth endpoints and keeps the credential store in step.
#[derive(Clone)]
pub struct SessionService {
    client: ApiClient,
    credentials: Arc<CredentialStore>,
}

impl SessionService {
    pub fn new(client: ApiClient, credentials: Arc<CredentialStore>) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Exchange credentials for a token and store it.
    ///
    /// Any rejection is an [`AppError::Auth`] and leaves the stored token alone.
    pub async fn sign_in(&self, account: &AccountCredentials) -> Result<(), AppError> {
        account.validate()?;

        let reply = self
            .client
            .post_anonymous(SIGNIN_PATH, account)
            .await
            .map_err(|e| rejection(e, LOGIN_FAILED))?;

        let token = reply.trim();
        if token.is_empty() {
            tracing::warn!(username = %account.username, "sign-in returned an empty token");
            return Err(AppError::auth(LOGIN_FAILED));
        }
        if token.starts_with(SIGNIN_REJECTED_PREFIX) {
            tracing::warn!(username = %account.username, "sign-in rejected");
            return Err(AppError::auth(token));
        }

        self.credentials.set_token(token)?;
        tracing::info!(username = %account.username, "signed in");
        Ok(())
    }

    /// Register a new account. Does not sign in.
    ///
    /// Returns the backend's reply; a plain-text reply comes back as a JSON string.
    pub async fn sign_up(&self, account: &AccountCredentials) -> Result<Value, AppError> {
        account.validate()?;

        let reply = self
            .client
            .post_anonymous(SIGNUP_PATH, account)
            .await
            .map_err(|e| rejection(e, SIGNUP_FAILED))?;

        let text = reply.trim();
        if text.starts_with(SIGNUP_REJECTED_PREFIX) {
            tracing::warn!(username = %account.username, "sign-up rejected");
            return Err(AppError::auth(text));
        }

        tracing::info!(username = %account.username, "account created");
        Ok(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
    }
}

/// A refused auth call becomes an auth failure; a call that never got an answer stays an API failure.
fn rejection(error: ApiError, fallback: &str) -> AppError {
    match error {
        ApiError::Status { message, status } => {
            tracing::warn!(status, "auth endpoint refused the request");
            AppError::auth(message.unwrap_or_else(|| fallback.to_string()))
        }
        other => AppError::Api(other),
    }
}
