//! Cookie storage media.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use cookie::time::OffsetDateTime;
use cookie::Cookie;
use parking_lot::Mutex;

use crate::{AuthzError, Result};

/// A place cookies are kept between requests.
///
/// Implementations enforce expiry: `load` never returns a cookie whose
/// `Expires` attribute lies in the past and purges it instead.
pub trait CookieStorage: Send + Sync {
    /// Return the live cookie with the given name.
    fn load(&self, name: &str) -> Result<Option<Cookie<'static>>>;

    /// Store a cookie, replacing any cookie with the same name.
    fn save(&self, cookie: Cookie<'static>) -> Result<()>;

    /// Forget the cookie with the given name. Removing a missing cookie is not an error.
    fn remove(&self, name: &str) -> Result<()>;
}

fn is_expired(cookie: &Cookie<'_>, now: OffsetDateTime) -> bool {
    cookie
        .expires_datetime()
        .map(|expires| expires <= now)
        .unwrap_or(false)
}

/// Cookies held in process memory; gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<HashMap<String, Cookie<'static>>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieStorage for MemoryCookieJar {
    fn load(&self, name: &str) -> Result<Option<Cookie<'static>>> {
        let mut cookies = self.cookies.lock();
        match cookies.get(name) {
            Some(cookie) if is_expired(cookie, OffsetDateTime::now_utc()) => {
                tracing::debug!(cookie = name, "purging expired cookie");
                cookies.remove(name);
                Ok(None)
            }
            other => Ok(other.cloned()),
        }
    }

    fn save(&self, cookie: Cookie<'static>) -> Result<()> {
        self.cookies.lock().insert(cookie.name().to_string(), cookie);
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.cookies.lock().remove(name);
        Ok(())
    }
}

/// Cookies persisted to a file, one percent-encoded `Set-Cookie` line each.
///
/// Lets a command-line session survive between invocations the way a browser
/// keeps its cookie jar between page loads. Lines that fail to parse are dropped.
#[derive(Debug)]
pub struct FileCookieJar {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCookieJar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> AuthzError {
        AuthzError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_all(&self) -> Result<Vec<Cookie<'static>>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        Ok(contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match Cookie::parse_encoded(line.to_string()) {
                Ok(cookie) => Some(cookie),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "skipping malformed cookie line");
                    None
                }
            })
            .collect())
    }

    fn write_all(&self, cookies: &[Cookie<'static>]) -> Result<()> {
        if cookies.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(self.io_error(e)),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path).map_err(|e| self.io_error(e))?;
        for cookie in cookies {
            writeln!(file, "{}", cookie.encoded()).map_err(|e| self.io_error(e))?;
        }
        Ok(())
    }
}

impl CookieStorage for FileCookieJar {
    fn load(&self, name: &str) -> Result<Option<Cookie<'static>>> {
        let _guard = self.lock.lock();
        let now = OffsetDateTime::now_utc();
        let cookies = self.read_all()?;

        let (live, expired): (Vec<_>, Vec<_>) =
            cookies.into_iter().partition(|cookie| !is_expired(cookie, now));
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "purging expired cookies");
            self.write_all(&live)?;
        }

        Ok(live.into_iter().find(|cookie| cookie.name() == name))
    }

    fn save(&self, cookie: Cookie<'static>) -> Result<()> {
        let _guard = self.lock.lock();
        let mut cookies = self.read_all()?;
        cookies.retain(|existing| existing.name() != cookie.name());
        cookies.push(cookie);
        self.write_all(&cookies)
    }

    fn remove(&self, name: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut cookies = self.read_all()?;
        let before = cookies.len();
        cookies.retain(|existing| existing.name() != name);
        if cookies.len() == before {
            return Ok(());
        }
        self.write_all(&cookies)
    }
}
