//! Credential Store: the bearer token and its cookie policy.

use std::sync::Arc;

use async_trait::async_trait;
use bookshelf_kernel::settings::Settings;
use bookshelf_kernel::{InitCtx, Module};
use cookie::time::{Duration, OffsetDateTime};
use cookie::{Cookie, SameSite};

use crate::storage::CookieStorage;
use crate::{AuthzError, Result};

/// Attributes applied to the token cookie.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub ttl: Duration,
    /// Only transmit over HTTPS; enabled in production
    pub secure: bool,
    /// Hide the cookie from script-readable channels
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "auth_token".to_string(),
            ttl: Duration::days(7),
            secure: false,
            http_only: true,
            same_site: SameSite::Strict,
            path: "/".to_string(),
        }
    }
}

impl CookieConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            name: settings.session.cookie_name.clone(),
            ttl: Duration::days(settings.session.token_ttl_days),
            secure: settings.environment.is_production(),
            http_only: settings.session.http_only,
            ..Self::default()
        }
    }
}

/// Holds the session token in a cookie storage medium.
pub struct CredentialStore {
    config: CookieConfig,
    storage: Arc<dyn CookieStorage>,
}

impl CredentialStore {
    pub fn new(config: CookieConfig, storage: Arc<dyn CookieStorage>) -> Self {
        Self { config, storage }
    }

    pub fn config(&self) -> &CookieConfig {
        &self.config
    }

    /// Persist the token, replacing any previous one.
    pub fn set_token(&self, token: &str) -> Result<()> {
        let cookie = Cookie::build((self.config.name.clone(), token.to_string()))
            .path(self.config.path.clone())
            .secure(self.config.secure)
            .http_only(self.config.http_only)
            .same_site(self.config.same_site)
            .max_age(self.config.ttl)
            .expires(OffsetDateTime::now_utc() + self.config.ttl)
            .build();

        self.storage.save(cookie)?;
        tracing::info!(cookie = %self.config.name, "session token stored");
        Ok(())
    }

    /// Current token, if the storage medium still holds a live one.
    ///
    /// A storage failure reads as "no token".
    pub fn get_token(&self) -> Option<String> {
        match self.storage.load(&self.config.name) {
            Ok(cookie) => cookie
                .map(|c| c.value().to_string())
                .filter(|token| !token.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read session token");
                None
            }
        }
    }

    /// Forget the token. Safe to call when no token is stored.
    pub fn clear_token(&self) -> Result<()> {
        self.storage.remove(&self.config.name)?;
        tracing::info!(cookie = %self.config.name, "session token cleared");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }

    /// Token for an endpoint that cannot be reached anonymously.
    pub fn require_token(&self) -> Result<String> {
        self.get_token().ok_or(AuthzError::Unauthenticated)
    }
}

#[async_trait]
impl Module for CredentialStore {
    fn name(&self) -> &'static str {
        "credentials"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            authenticated = self.is_authenticated(),
            secure = self.config.secure,
            "credential store initialized"
        );
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.clear_token()?;
        Ok(())
    }
}
