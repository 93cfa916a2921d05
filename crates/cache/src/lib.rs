//! In-memory query cache.
//!
//! Holds fetched data keyed by a logical resource name and coordinates the
//! writers of each key: newer fetches supersede older ones, mutations cancel
//! in-flight fetches before editing optimistically, and failed mutations roll
//! back to the exact data they replaced.

pub mod mutation;
pub mod query;

pub use mutation::{MutationState, OptimisticMutation};
pub use query::{FetchTicket, QueryCache, QueryKey, QueryState, QueryStatus};
