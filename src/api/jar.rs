//! Cookie jar for the HTTP client
//!
//! Holds the cookies the portal sets, most importantly the httponly refresh
//! credential, and sends them back on matching requests. A jar opened on a
//! file rewrites it after every change so another process can pick the
//! session up and refresh.

use crate::error::Result;
use cookie::time::OffsetDateTime;
use cookie::Cookie;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use reqwest::Url;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Cookies received from the portal, optionally mirrored to disk
pub struct SessionJar {
    cookies: RwLock<Vec<Cookie<'static>>>,
    path: Option<PathBuf>,
}

impl SessionJar {
    /// A jar that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            cookies: RwLock::new(Vec::new()),
            path: None,
        }
    }

    /// Open a jar persisted at `path`, loading whatever is still valid
    ///
    /// A missing file is an empty jar. Lines that do not parse are skipped.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cookies = match fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .filter_map(|line| Cookie::parse(line.trim().to_string()).ok())
                .filter(|cookie| !is_expired(cookie))
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("Failed to read cookie jar {}: {}", path.display(), e);
                Vec::new()
            }
        };

        Self {
            cookies: RwLock::new(cookies),
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of the first unexpired cookie called `name`
    pub fn get(&self, name: &str) -> Option<String> {
        self.read()
            .iter()
            .find(|cookie| cookie.name() == name && !is_expired(cookie))
            .map(|cookie| cookie.value().to_string())
    }

    /// Forget every cookie and delete the backing file
    pub fn clear(&self) -> Result<()> {
        self.write().clear();
        match &self.path {
            Some(path) => match fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
            None => Ok(()),
        }
    }

    /// Store a cookie received from `url`
    ///
    /// Host and default path are filled in, `Max-Age` becomes an absolute
    /// expiry, and a cookie that is already expired removes its namesake.
    fn insert(&self, mut cookie: Cookie<'static>, url: &Url) {
        let Some(host) = url.host_str() else {
            return;
        };

        if cookie.domain().is_none() {
            cookie.set_domain(host.to_string());
        }
        if cookie.path().is_none() {
            cookie.set_path(default_path(url));
        }
        if let Some(max_age) = cookie.max_age() {
            cookie.set_expires(OffsetDateTime::now_utc() + max_age);
            cookie.set_max_age(None);
        }

        let mut cookies = self.write();
        cookies.retain(|existing| {
            !(existing.name() == cookie.name()
                && existing.domain() == cookie.domain()
                && existing.path() == cookie.path())
        });

        if is_expired(&cookie) {
            debug!("Server expired cookie {}", cookie.name());
        } else {
            debug!("Storing cookie {} for {}", cookie.name(), host);
            cookies.push(cookie);
        }
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };

        let content: String = self
            .read()
            .iter()
            .filter(|cookie| !is_expired(cookie))
            .map(|cookie| format!("{}\n", cookie))
            .collect();

        let written = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
        .and_then(|()| fs::write(path, content));

        if let Err(e) = written {
            warn!("Failed to write cookie jar {}: {}", path.display(), e);
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Cookie<'static>>> {
        self.cookies.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Cookie<'static>>> {
        self.cookies.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for SessionJar {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let mut changed = false;
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            match Cookie::parse(raw.to_string()) {
                Ok(cookie) => {
                    self.insert(cookie, url);
                    changed = true;
                }
                Err(e) => debug!("Ignoring malformed Set-Cookie: {}", e),
            }
        }

        if changed {
            self.persist();
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self
            .read()
            .iter()
            .filter(|cookie| matches(cookie, url))
            .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}

fn is_expired(cookie: &Cookie<'_>) -> bool {
    cookie
        .expires_datetime()
        .is_some_and(|at| at <= OffsetDateTime::now_utc())
}

/// Directory of the request path, per RFC 6265 section 5.1.4
fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(end) => path[..end].to_string(),
    }
}

fn is_loopback(host: &str) -> bool {
    host == "localhost" || host == "127.0.0.1" || host == "[::1]"
}

fn matches(cookie: &Cookie<'_>, url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    if is_expired(cookie) {
        return false;
    }

    let domain_ok = match cookie.domain() {
        Some(domain) => {
            let domain = domain.trim_start_matches('.');
            host.eq_ignore_ascii_case(domain)
                || host
                    .to_ascii_lowercase()
                    .ends_with(&format!(".{}", domain.to_ascii_lowercase()))
        }
        None => false,
    };

    let path_ok = match cookie.path() {
        Some(prefix) => {
            let path = url.path();
            path == prefix
                || (path.starts_with(prefix)
                    && (prefix.ends_with('/') || path[prefix.len()..].starts_with('/')))
        }
        None => true,
    };

    let secure_ok =
        cookie.secure() != Some(true) || url.scheme() == "https" || is_loopback(host);

    domain_ok && path_ok && secure_ok
}
