use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bookshelf_kernel::{InitCtx, Module};
use parking_lot::{Mutex, MutexGuard};

/// Logical name of a cached resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Cow<'static, str>);

impl QueryKey {
    pub const fn from_static(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }

    pub fn new(key: impl Into<String>) -> Self {
        Self(Cow::Owned(key.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    #[default]
    Idle,
    Fetching,
    Success,
    Error,
}

/// Point-in-time view of one cache entry.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub data: Option<Arc<T>>,
    pub status: QueryStatus,
    pub error: Option<String>,
    pub is_stale: bool,
    pub updated_at: Option<Instant>,
}

/// Proof that a fetch was started; only the newest ticket for a key may write.
#[derive(Debug)]
#[must_use = "a fetch ticket must be passed to complete_fetch"]
pub struct FetchTicket {
    key: QueryKey,
    generation: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

struct Entry<T> {
    data: Option<Arc<T>>,
    status: QueryStatus,
    error: Option<String>,
    stale: bool,
    generation: u64,
    updated_at: Option<Instant>,
    /// Identity of this entry; a removed and recreated key gets a new one.
    epoch: u64,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            data: None,
            status: QueryStatus::Idle,
            error: None,
            stale: false,
            generation: 0,
            updated_at: None,
            epoch: 0,
        }
    }
}

impl<T> Entry<T> {
    fn settle_status(&mut self) {
        self.status = if self.data.is_some() {
            QueryStatus::Success
        } else {
            QueryStatus::Idle
        };
    }

    fn store(&mut self, data: Option<Arc<T>>) {
        self.data = data;
        self.error = None;
        self.updated_at = Some(Instant::now());
    }
}

/// Shared cache of fetched data. Cloning yields another handle to the same entries.
///
/// The lock is never held across an await point; every operation is a single
/// short critical section.
pub struct QueryCache<T> {
    entries: Arc<Mutex<HashMap<QueryKey, Entry<T>>>>,
    epochs: Arc<AtomicU64>,
}

impl<T> Clone for QueryCache<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            epochs: Arc::clone(&self.epochs),
        }
    }
}

impl<T> Default for QueryCache<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            epochs: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<T> QueryCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry<T>>> {
        self.entries.lock()
    }

    fn fresh_entry(&self) -> Entry<T> {
        Entry {
            epoch: self.epochs.fetch_add(1, Ordering::Relaxed) + 1,
            ..Entry::default()
        }
    }

    pub fn get_query_data(&self, key: &QueryKey) -> Option<Arc<T>> {
        self.lock().get(key).and_then(|entry| entry.data.clone())
    }

    pub fn state(&self, key: &QueryKey) -> QueryState<T> {
        match self.lock().get(key) {
            Some(entry) => QueryState {
                data: entry.data.clone(),
                status: entry.status,
                error: entry.error.clone(),
                is_stale: entry.stale,
                updated_at: entry.updated_at,
            },
            None => QueryState {
                data: None,
                status: QueryStatus::Idle,
                error: None,
                is_stale: false,
                updated_at: None,
            },
        }
    }

    /// Replace the data for `key` without touching any in-flight fetch.
    pub fn set_query_data(&self, key: &QueryKey, data: Arc<T>) {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_insert_with(|| self.fresh_entry());
        entry.store(Some(data));
        if entry.status != QueryStatus::Fetching {
            entry.status = QueryStatus::Success;
        }
    }

    /// Derive new data from the current data and store it.
    pub fn update_query_data<F>(&self, key: &QueryKey, update: F) -> Arc<T>
    where
        F: FnOnce(Option<&T>) -> T,
    {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_insert_with(|| self.fresh_entry());
        let next = Arc::new(update(entry.data.as_deref()));
        entry.store(Some(next.clone()));
        if entry.status != QueryStatus::Fetching {
            entry.status = QueryStatus::Success;
        }
        next
    }

    /// Register a new fetch for `key`, superseding any fetch already in flight.
    pub fn begin_fetch(&self, key: &QueryKey) -> FetchTicket {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_insert_with(|| self.fresh_entry());
        entry.generation += 1;
        entry.status = QueryStatus::Fetching;
        tracing::trace!(key = %key, generation = entry.generation, "fetch started");
        FetchTicket {
            key: key.clone(),
            generation: entry.generation,
        }
    }

    /// Record the outcome of a fetch.
    ///
    /// Returns `false` and discards the result when the ticket was superseded by
    /// a newer fetch or cancelled. A failed fetch keeps the previous data.
    pub fn complete_fetch(&self, ticket: FetchTicket, result: Result<T, String>) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(&ticket.key) else {
            tracing::debug!(key = %ticket.key, "discarding fetch for removed query");
            return false;
        };
        if entry.generation != ticket.generation {
            tracing::debug!(
                key = %ticket.key,
                ticket = ticket.generation,
                current = entry.generation,
                "discarding superseded fetch"
            );
            return false;
        }

        match result {
            Ok(data) => {
                entry.store(Some(Arc::new(data)));
                entry.stale = false;
                entry.status = QueryStatus::Success;
            }
            Err(error) => {
                entry.error = Some(error);
                entry.status = QueryStatus::Error;
            }
        }
        true
    }

    /// Supersede any in-flight fetch for `key`. Returns whether one was running.
    pub fn cancel_queries(&self, key: &QueryKey) -> bool {
        let mut entries = self.lock();
        match entries.get_mut(key) {
            Some(entry) if entry.status == QueryStatus::Fetching => {
                entry.generation += 1;
                entry.settle_status();
                tracing::debug!(key = %key, "cancelled in-flight fetch");
                true
            }
            _ => false,
        }
    }

    /// Atomically cancel in-flight fetches, snapshot the data, and apply `edit`.
    ///
    /// Returns the snapshot (the exact `Arc` that was replaced) and the epoch of
    /// the edited entry.
    pub(crate) fn begin_optimistic<F>(&self, key: &QueryKey, edit: F) -> (Option<Arc<T>>, u64)
    where
        F: FnOnce(Option<&T>) -> T,
    {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_insert_with(|| self.fresh_entry());
        if entry.status == QueryStatus::Fetching {
            entry.generation += 1;
            entry.settle_status();
            tracing::debug!(key = %key, "cancelled in-flight fetch before optimistic edit");
        }

        let snapshot = entry.data.clone();
        let edited = Arc::new(edit(snapshot.as_deref()));
        entry.store(Some(edited));
        entry.status = QueryStatus::Success;
        (snapshot, entry.epoch)
    }

    /// Put `snapshot` back exactly as it was captured.
    ///
    /// Does nothing and returns `false` when the entry edited at `epoch` has
    /// since been removed or cleared.
    pub(crate) fn restore(&self, key: &QueryKey, snapshot: Option<Arc<T>>, epoch: u64) -> bool {
        let mut entries = self.lock();
        match entries.get_mut(key) {
            Some(entry) if entry.epoch == epoch => {
                entry.store(snapshot);
                if entry.status != QueryStatus::Fetching {
                    entry.settle_status();
                }
                true
            }
            _ => {
                tracing::debug!(key = %key, "entry dropped since the edit; snapshot discarded");
                false
            }
        }
    }

    /// Mark `key` stale so the owner refetches it.
    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(entry) = self.lock().get_mut(key) {
            entry.stale = true;
            tracing::debug!(key = %key, "query invalidated");
        }
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.lock().get(key).map(|entry| entry.stale).unwrap_or(false)
    }

    pub fn remove(&self, key: &QueryKey) {
        self.lock().remove(key);
    }

    /// Drop every entry; outstanding fetch tickets become unable to write.
    pub fn clear(&self) {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        tracing::debug!(count, "query cache cleared");
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Module for QueryCache<T> {
    fn name(&self) -> &'static str {
        "query-cache"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "query cache initialized");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.clear();
        Ok(())
    }
}
