//! Optimistic edits with exact rollback.

use std::sync::Arc;

use crate::query::{QueryCache, QueryKey};

/// Lifecycle of one optimistic mutation.
#[derive(Debug)]
pub enum MutationState<T> {
    /// Edit applied to the cache; `snapshot` is the data it replaced.
    Pending { snapshot: Option<Arc<T>> },
    /// The backend accepted the change; the snapshot was released.
    Committed,
    /// The backend refused; the cache holds the snapshot again.
    RolledBack,
}

impl<T> MutationState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, MutationState::Pending { .. })
    }
}

/// An optimistic edit of one cache key awaiting its backend outcome.
///
/// `commit` and `rollback` consume the mutation, so exactly one outcome can be
/// recorded. Each mutation restores only its own snapshot: interleaved
/// mutations on the same key never roll back to each other's state.
#[must_use = "an optimistic mutation must be committed or rolled back"]
pub struct OptimisticMutation<T> {
    cache: QueryCache<T>,
    key: QueryKey,
    epoch: u64,
    state: MutationState<T>,
}

impl<T> OptimisticMutation<T> {
    /// Cancel in-flight fetches of `key`, snapshot its data and apply `edit`.
    pub fn begin<F>(cache: &QueryCache<T>, key: QueryKey, edit: F) -> Self
    where
        F: FnOnce(Option<&T>) -> T,
    {
        let (snapshot, epoch) = cache.begin_optimistic(&key, edit);
        tracing::debug!(key = %key, had_data = snapshot.is_some(), "optimistic edit applied");
        Self {
            cache: cache.clone(),
            key,
            epoch,
            state: MutationState::Pending { snapshot },
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn state(&self) -> &MutationState<T> {
        &self.state
    }

    /// Data the edit replaced.
    pub fn snapshot(&self) -> Option<&Arc<T>> {
        match &self.state {
            MutationState::Pending { snapshot } => snapshot.as_ref(),
            _ => None,
        }
    }

    /// Keep the optimistic edit and release the snapshot.
    pub fn commit(mut self) -> MutationState<T> {
        self.state = MutationState::Committed;
        tracing::debug!(key = %self.key, "optimistic edit committed");
        self.state
    }

    /// Put back the exact data this mutation replaced.
    ///
    /// If the key was removed or the cache cleared in the meantime, the
    /// snapshot is dropped instead; it belongs to state that no longer exists.
    pub fn rollback(self) -> MutationState<T> {
        if let MutationState::Pending { snapshot } = self.state {
            let restored = self.cache.restore(&self.key, snapshot, self.epoch);
            tracing::debug!(key = %self.key, restored, "optimistic edit rolled back");
        }
        MutationState::RolledBack
    }
}
