//! Browser cookie persistence between sessions.
//!
//! The directory front-end throttles fresh sessions much harder than
//! returning ones, so cookies captured at the end of a run are replayed at
//! the start of the next. The store is a plain JSON array on disk; a
//! missing or unreadable file is an empty jar, never an error.

use std::path::{Path, PathBuf};

use chromiumoxide::cdp::browser_protocol::network::{Cookie, CookieParam};
use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

/// One persisted cookie. Session-scoped on replay: expiry is deliberately
/// not stored, the upstream session cookies are rotated server-side anyway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

impl From<&Cookie> for StoredCookie {
    fn from(cookie: &Cookie) -> Self {
        Self {
            name: cookie.name.clone(),
            value: cookie.value.clone(),
            domain: cookie.domain.clone(),
            path: cookie.path.clone(),
            secure: cookie.secure,
            http_only: cookie.http_only,
        }
    }
}

impl From<StoredCookie> for CookieParam {
    fn from(stored: StoredCookie) -> Self {
        let mut param = CookieParam::new(stored.name, stored.value);
        if !stored.domain.is_empty() {
            param.domain = Some(stored.domain);
        }
        if !stored.path.is_empty() {
            param.path = Some(stored.path);
        }
        param.secure = Some(stored.secure);
        param.http_only = Some(stored.http_only);
        param
    }
}

/// File-backed cookie jar.
#[derive(Debug, Clone)]
pub struct CookieStore {
    path: PathBuf,
}

impl CookieStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted cookies.
    ///
    /// A missing file means a first run; a corrupt file is logged and
    /// treated the same way. Neither blocks scraping.
    pub async fn load(&self) -> Vec<StoredCookie> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no cookie file, starting fresh");
                return Vec::new();
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "cookie file unreadable");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<StoredCookie>>(&raw) {
            Ok(cookies) => {
                tracing::debug!(count = cookies.len(), "loaded persisted cookies");
                cookies
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "cookie file corrupt, ignoring");
                Vec::new()
            }
        }
    }

    /// Persists `cookies`, replacing the previous contents atomically
    /// (write to a sibling temp file, then rename).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Configuration`] when the file cannot be
    /// written, typically a missing parent directory or permissions.
    pub async fn save(&self, cookies: &[StoredCookie]) -> Result<(), ScraperError> {
        let body = serde_json::to_string_pretty(cookies).map_err(|e| {
            ScraperError::Configuration {
                reason: format!("cookie serialization failed: {e}"),
            }
        })?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await.map_err(|e| {
            ScraperError::Configuration {
                reason: format!("cannot write {}: {e}", tmp.display()),
            }
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            ScraperError::Configuration {
                reason: format!("cannot move cookie file into place: {e}"),
            }
        })?;

        tracing::debug!(count = cookies.len(), path = %self.path.display(), "saved cookies");
        Ok(())
    }
}
