//! Process-wide client state and its lifecycle.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bookshelf_authz::{guard, CookieConfig, CookieStorage, CredentialStore, Route};
use bookshelf_cache::QueryCache;
use bookshelf_events::NotificationQueue;
use bookshelf_http::ApiClient;
use bookshelf_kernel::settings::Settings;
use bookshelf_kernel::{InitCtx, ModuleRegistry};
use serde_json::Value;

use crate::error::AppError;
use crate::modules::books::api::BooksApi;
use crate::modules::books::models::Book;
use crate::modules::books::BookCatalog;
use crate::modules::session::{AccountCredentials, SessionService};

/// Everything one client session shares: credentials, cache, catalog and notifications.
///
/// Built once per process. Signing in starts the modules, logging out stops
/// them, which clears the cached collection and the stored token.
pub struct App {
    settings: Settings,
    registry: ModuleRegistry,
    credentials: Arc<CredentialStore>,
    catalog: Arc<BookCatalog>,
    session: SessionService,
    notifications: NotificationQueue,
}

impl App {
    /// Wire the modules over `storage` and bring them up.
    ///
    /// When a live token is already stored the catalog performs its initial fetch.
    pub async fn bootstrap(
        settings: Settings,
        storage: Arc<dyn CookieStorage>,
    ) -> anyhow::Result<Self> {
        let credentials = Arc::new(CredentialStore::new(
            CookieConfig::from_settings(&settings),
            storage,
        ));

        let client = ApiClient::builder()
            .base_url(settings.api.base_url.clone())
            .timeout(settings.api.timeout_ms.map(Duration::from_millis))
            .credentials(credentials.clone())
            .build()
            .with_context(|| "failed to build API client")?;

        let notifications =
            NotificationQueue::new(Duration::from_millis(settings.notifications.duration_ms));
        let cache: QueryCache<Vec<Book>> = QueryCache::new();
        let catalog = Arc::new(BookCatalog::new(
            BooksApi::new(client.clone()),
            cache.clone(),
            credentials.clone(),
            Arc::new(notifications.clone()),
        ));
        let session = SessionService::new(client, credentials.clone());

        let mut registry = ModuleRegistry::new();
        registry.register_core(credentials.clone());
        registry.register_core(Arc::new(cache));
        registry.register_custom(catalog.clone());

        let app = Self {
            settings,
            registry,
            credentials,
            catalog,
            session,
            notifications,
        };

        let ctx = app.ctx();
        app.registry.init_all(&ctx).await?;
        app.registry.start_all(&ctx).await?;

        tracing::info!(
            env = ?app.settings.environment,
            api = %app.settings.api.base_url,
            authenticated = app.is_authenticated(),
            "bookshelf client ready"
        );
        Ok(app)
    }

    fn ctx(&self) -> InitCtx<'_> {
        InitCtx {
            settings: &self.settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn catalog(&self) -> &BookCatalog {
        &self.catalog
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    /// Where a request for `requested` actually lands given the current session.
    pub fn route(&self, requested: Route) -> Route {
        guard(requested, self.is_authenticated())
    }

    /// Sign in and start the session: the catalog fetches the collection.
    pub async fn login(&self, account: &AccountCredentials) -> Result<(), AppError> {
        self.session.sign_in(account).await?;
        self.registry.start_all(&self.ctx()).await?;
        Ok(())
    }

    pub async fn signup(&self, account: &AccountCredentials) -> Result<Value, AppError> {
        self.session.sign_up(account).await
    }

    /// Tear the session down: cached data and the stored token are dropped.
    pub async fn logout(&self) -> Result<(), AppError> {
        self.registry.stop_all().await?;
        self.notifications.clear();
        tracing::info!("logged out");
        Ok(())
    }
}
