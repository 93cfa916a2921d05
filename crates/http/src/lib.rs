//! HTTP client facade for the bookshelf backend.
//!
//! Every request goes to `{base_url}{path}` with a JSON content type and, when
//! the credential store holds a token, an `Authorization: Bearer` header.
//! Requests without a token are still sent; the backend is expected to reject
//! them.

pub mod error;

use std::sync::Arc;
use std::time::Duration;

use bookshelf_authz::CredentialStore;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use error::ApiError;

pub type Result<T> = std::result::Result<T, ApiError>;

/// JSON client for the backend REST surface
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    credentials: Arc<CredentialStore>,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// `GET` a JSON document
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.dispatch(self.request(Method::GET, path)).await?;
        read_json(response).await
    }

    /// `POST` a JSON body and decode the JSON reply
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .dispatch(self.request(Method::POST, path).json(body))
            .await?;
        read_json(response).await
    }

    /// `PUT` a JSON body and decode the JSON reply
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .dispatch(self.request(Method::PUT, path).json(body))
            .await?;
        read_json(response).await
    }

    /// `DELETE` a resource; the reply body is ignored
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.dispatch(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    /// `POST` without credentials and return the raw reply text
    ///
    /// Used by the sign-in and sign-up endpoints, which answer in plain text.
    pub async fn post_anonymous<B>(&self, path: &str, body: &B) -> Result<String>
    where
        B: Serialize + ?Sized,
    {
        let request = self
            .http
            .request(Method::POST, self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        let response = self.dispatch(request).await?;
        Ok(response.text().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .http
            .request(method, self.url(path))
            .header(CONTENT_TYPE, "application/json");

        match self.credentials.get_token() {
            Some(token) => request.bearer_auth(token),
            None => {
                tracing::debug!(path, "no session token; sending unauthenticated request");
                request
            }
        }
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "request did not complete");
            ApiError::from(e)
        })?;

        let status = response.status();
        tracing::debug!(url = %response.url(), status = status.as_u16(), "response received");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let error = ApiError::from_body(status.as_u16(), &body);
        tracing::warn!(status = status.as_u16(), error = %error, "request rejected");
        Err(error)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Builder for configuring [`ApiClient`] instances
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    credentials: Option<Arc<CredentialStore>>,
}

impl ApiClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            timeout: None,
            credentials: None,
        }
    }

    /// Base path every endpoint is appended to, e.g. `http://host/api`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Transport-level timeout; unset means requests may wait indefinitely
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn credentials(mut self, credentials: Arc<CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| ApiError::Request("base_url is required".into()))?;
        let credentials = self
            .credentials
            .ok_or_else(|| ApiError::Request("credential store is required".into()))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(ApiClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            credentials,
        })
    }
}
