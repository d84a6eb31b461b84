//! Access token storage
//!
//! The access token lives in a cookie named `access_token` (by default) with
//! `Path=/`, a one day lifetime, `Secure` and `SameSite=Strict`. The refresh
//! credential is a separate httponly cookie owned by the server and never
//! touched here.

use crate::config::CookieConfig;
use crate::error::{Error, Result};
use cookie::time::{Duration, OffsetDateTime};
use cookie::{Cookie, SameSite};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Where the current access token is kept
pub trait TokenStore: Send + Sync {
    /// Current token, if one is stored and its cookie has not expired
    fn get(&self) -> Option<String>;

    /// Store a token, replacing any previous one
    fn set(&self, token: &str) -> Result<()>;

    /// Remove the stored token
    fn clear(&self) -> Result<()>;
}

/// Attributes applied to every access token cookie
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    pub name: String,
    pub path: String,
    pub max_age: Duration,
    pub secure: bool,
    pub same_site: SameSite,
}

impl CookiePolicy {
    /// Build the cookie carrying `token`
    pub fn build(&self, token: &str) -> Cookie<'static> {
        Cookie::build((self.name.clone(), token.to_string()))
            .path(self.path.clone())
            .max_age(self.max_age)
            .expires(OffsetDateTime::now_utc() + self.max_age)
            .secure(self.secure)
            .same_site(self.same_site)
            .build()
    }
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self::from(&CookieConfig::default())
    }
}

impl From<&CookieConfig> for CookiePolicy {
    fn from(config: &CookieConfig) -> Self {
        Self {
            name: config.name.clone(),
            path: config.path.clone(),
            max_age: Duration::seconds(config.max_age_secs),
            secure: config.secure,
            same_site: config.same_site.into(),
        }
    }
}

fn is_cookie_expired(cookie: &Cookie<'_>) -> bool {
    cookie
        .expires_datetime()
        .map(|at| at <= OffsetDateTime::now_utc())
        .unwrap_or(false)
}

/// In-process cookie jar holding a single access token cookie
pub struct MemoryTokenStore {
    policy: CookiePolicy,
    cookie: Mutex<Option<Cookie<'static>>>,
}

impl MemoryTokenStore {
    /// Create an empty store
    pub fn new(policy: CookiePolicy) -> Self {
        Self {
            policy,
            cookie: Mutex::new(None),
        }
    }

    /// The cookie as it would be sent in `Set-Cookie`
    pub fn cookie(&self) -> Option<Cookie<'static>> {
        self.cookie
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new(CookiePolicy::default())
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        let mut slot = self.cookie.lock().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().is_some_and(is_cookie_expired) {
            *slot = None;
        }
        slot.as_ref().map(|c| c.value().to_string())
    }

    fn set(&self, token: &str) -> Result<()> {
        let cookie = self.policy.build(token);
        *self.cookie.lock().unwrap_or_else(|e| e.into_inner()) = Some(cookie);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.cookie.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Cookie persisted as a `Set-Cookie` line on disk
///
/// Lets the CLI keep a session between invocations.
pub struct FileTokenStore {
    policy: CookiePolicy,
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>, policy: CookiePolicy) -> Self {
        Self {
            policy,
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Create a store from the `[cookie]` config section
    pub fn from_config(config: &CookieConfig) -> Self {
        Self::new(config.store_path.clone(), CookiePolicy::from(config))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_cookie(&self) -> Result<Option<Cookie<'static>>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let cookie = Cookie::parse(content.trim().to_string())
            .map_err(|e| Error::Other(format!("Invalid cookie file: {}", e)))?;

        if cookie.name() != self.policy.name {
            return Ok(None);
        }
        Ok(Some(cookie))
    }

    fn remove_file(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        match self.read_cookie() {
            Ok(Some(cookie)) if is_cookie_expired(&cookie) => {
                tracing::debug!("Stored access token cookie expired, discarding");
                if let Err(e) = self.remove_file() {
                    tracing::warn!("Failed to remove expired cookie file: {}", e);
                }
                None
            }
            Ok(cookie) => cookie.map(|c| c.value().to_string()),
            Err(e) => {
                tracing::warn!("Failed to read cookie file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let cookie = self.policy.build(token);
        fs::write(&self.path, format!("{}\n", cookie))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.remove_file()
    }
}
