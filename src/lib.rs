//! Bookshelf client library.
//!
//! Wires the credential store, API client, query cache and notification queue
//! into an [`App`] and exposes the catalog and session operations built on them.

pub mod app;
pub mod error;
pub mod modules;
pub mod utils;

pub use app::App;
pub use error::AppError;
/// Re-export commonly used types
pub use modules::*;
