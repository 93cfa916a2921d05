pub mod api;
pub mod models;
pub mod view;

use std::sync::Arc;

use async_trait::async_trait;
use bookshelf_authz::CredentialStore;
use bookshelf_cache::{MutationState, OptimisticMutation, QueryCache, QueryKey, QueryState};
use bookshelf_events::Notifier;
use bookshelf_kernel::{InitCtx, Module};

use crate::error::AppError;
use api::BooksApi;
use models::{Book, BookId, BookPatch, NewBook};

/// Cache key of the book collection.
pub const BOOKS_KEY: QueryKey = QueryKey::from_static("books");

const FETCH_FAILED: &str = "Failed to fetch books";
const CREATED: &str = "Book added successfully";
const UPDATED: &str = "Book updated successfully";
const REMOVED: &str = "Book removed successfully";

/// The book collection as displayed, reconciled with the backend after every mutation.
///
/// Reads come from the query cache. Create and update write through to the
/// backend and refetch on success; delete edits the cache optimistically and
/// rolls back on failure. Every settled delete ends with a refetch.
pub struct BookCatalog {
    api: BooksApi,
    cache: QueryCache<Vec<Book>>,
    credentials: Arc<CredentialStore>,
    notifier: Arc<dyn Notifier>,
}

impl BookCatalog {
    pub fn new(
        api: BooksApi,
        cache: QueryCache<Vec<Book>>,
        credentials: Arc<CredentialStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            cache,
            credentials,
            notifier,
        }
    }

    pub fn cache(&self) -> &QueryCache<Vec<Book>> {
        &self.cache
    }

    /// Cached collection, if it has been fetched.
    pub fn books(&self) -> Option<Arc<Vec<Book>>> {
        self.cache.get_query_data(&BOOKS_KEY)
    }

    pub fn state(&self) -> QueryState<Vec<Book>> {
        self.cache.state(&BOOKS_KEY)
    }

    /// Fetch the collection into the cache.
    ///
    /// Disabled while signed out: returns `Ok(None)` without issuing a request.
    /// A fetch superseded by a newer fetch or by a delete leaves the cache alone.
    pub async fn fetch(&self) -> Result<Option<Arc<Vec<Book>>>, AppError> {
        if !self.credentials.is_authenticated() {
            tracing::debug!(key = %BOOKS_KEY, "not signed in; fetch disabled");
            return Ok(None);
        }

        let ticket = self.cache.begin_fetch(&BOOKS_KEY);
        match self.api.list().await {
            Ok(books) => {
                let count = books.len();
                if self.cache.complete_fetch(ticket, Ok(books)) {
                    tracing::debug!(count, "book collection fetched");
                }
                Ok(self.books())
            }
            Err(e) => {
                if self.cache.complete_fetch(ticket, Err(e.to_string())) {
                    tracing::warn!(error = %e, "failed to fetch books");
                    self.notifier.notify_error(FETCH_FAILED);
                }
                Err(e.into())
            }
        }
    }

    /// Load a single book straight from the backend.
    pub async fn get(&self, id: &BookId) -> Result<Book, AppError> {
        Ok(self.api.get(id).await?)
    }

    /// Create a book. A failure leaves the cache untouched.
    pub async fn create(&self, draft: &NewBook) -> Result<Book, AppError> {
        draft.validate()?;

        let created = self.api.create(draft).await?;
        tracing::info!(id = %created.id, "book created");
        self.notifier.notify_success(CREATED);
        self.resync().await;
        Ok(created)
    }

    /// Apply a partial update to the book `id`. A failure leaves the cache untouched.
    pub async fn update(&self, id: &BookId, patch: &BookPatch) -> Result<Book, AppError> {
        patch.validate()?;

        let updated = self.api.update(id, patch).await?;
        tracing::info!(id = %updated.id, "book updated");
        self.notifier.notify_success(UPDATED);
        self.resync().await;
        Ok(updated)
    }

    /// Remove the book `id`, showing the removal before the backend answers.
    ///
    /// On failure the cache gets back exactly the collection this call replaced.
    /// Exactly one outcome is reported, and a refetch always runs last.
    pub async fn delete(&self, id: &BookId) -> Result<(), AppError> {
        let mutation = OptimisticMutation::begin(&self.cache, BOOKS_KEY, |books| {
            books
                .map(|books| books.iter().filter(|b| &b.id != id).cloned().collect())
                .unwrap_or_default()
        });

        let outcome = match self.api.delete(id).await {
            Ok(()) => {
                let state = mutation.commit();
                debug_assert!(matches!(state, MutationState::Committed));
                tracing::info!(%id, "book deleted");
                self.notifier.notify_success(REMOVED);
                Ok(())
            }
            Err(e) => {
                let state = mutation.rollback();
                debug_assert!(matches!(state, MutationState::RolledBack));
                tracing::warn!(%id, error = %e, "delete failed; optimistic removal rolled back");
                self.notifier.notify_error(&e.to_string());
                Err(e.into())
            }
        };

        self.resync().await;
        outcome
    }

    async fn resync(&self) {
        self.cache.invalidate(&BOOKS_KEY);
        if let Err(e) = self.fetch().await {
            tracing::debug!(error = %e, "resync after mutation failed");
        }
    }
}

#[async_trait]
impl Module for BookCatalog {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if let Err(e) = self.fetch().await {
            tracing::warn!(module = self.name(), error = %e, "initial fetch failed");
        }
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.cache.remove(&BOOKS_KEY);
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}
