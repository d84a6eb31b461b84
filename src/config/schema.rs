//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub cookie: CookieConfig,
}

/// Portal API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout. Unset means the transport default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

/// Session timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How often the watchdog looks at the stored token
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Refresh proactively when fewer seconds than this remain
    #[serde(default = "default_refresh_threshold_secs")]
    pub refresh_threshold_secs: i64,

    /// Treat tokens as expired this many seconds early
    #[serde(default)]
    pub leeway_secs: i64,

    /// Route consumers should navigate to after logout
    #[serde(default = "default_home_route")]
    pub home_route: String,
}

fn default_check_interval_secs() -> u64 {
    30
}

fn default_refresh_threshold_secs() -> i64 {
    60
}

fn default_home_route() -> String {
    "/".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            refresh_threshold_secs: default_refresh_threshold_secs(),
            leeway_secs: 0,
            home_route: default_home_route(),
        }
    }
}

/// Attributes of the access token cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    #[serde(default = "default_cookie_name")]
    pub name: String,

    #[serde(default = "default_cookie_path")]
    pub path: String,

    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: i64,

    #[serde(default = "default_secure")]
    pub secure: bool,

    #[serde(default)]
    pub same_site: SameSitePolicy,

    /// Where the CLI keeps the cookie between invocations
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Where the CLI keeps the cookies the server sets, refresh credential included
    #[serde(default = "default_jar_path")]
    pub jar_path: PathBuf,
}

fn default_cookie_name() -> String {
    "access_token".to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_max_age_secs() -> i64 {
    86_400
}

fn default_secure() -> bool {
    true
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./.portal-session/cookie")
}

fn default_jar_path() -> PathBuf {
    PathBuf::from("./.portal-session/jar")
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            path: default_cookie_path(),
            max_age_secs: default_max_age_secs(),
            secure: default_secure(),
            same_site: SameSitePolicy::default(),
            store_path: default_store_path(),
            jar_path: default_jar_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    #[default]
    Strict,
    Lax,
}

impl From<SameSitePolicy> for cookie::SameSite {
    fn from(policy: SameSitePolicy) -> Self {
        match policy {
            SameSitePolicy::Strict => cookie::SameSite::Strict,
            SameSitePolicy::Lax => cookie::SameSite::Lax,
        }
    }
}
