//! Authentication state for the bookshelf client.
//!
//! The bearer token lives in a cookie held by a [`CookieStorage`] medium. The
//! medium, not the store, is responsible for forgetting expired cookies, so the
//! presence of a token is the whole authentication signal.

pub mod guard;
pub mod storage;
pub mod store;

use std::path::PathBuf;

use thiserror::Error;

pub use guard::{guard, Route};
pub use storage::{CookieStorage, FileCookieJar, MemoryCookieJar};
pub use store::{CookieConfig, CredentialStore};

/// Errors raised by credential storage.
#[derive(Error, Debug)]
pub enum AuthzError {
    #[error("cookie jar {path} is not accessible: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not signed in")]
    Unauthenticated,
}

pub type Result<T> = std::result::Result<T, AuthzError>;
