//! Session snapshot and lifecycle events

use crate::auth::models::UserProfile;
use serde::{Deserialize, Serialize};

/// Observable state of the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub access_token: Option<String>,
    pub is_authenticated: bool,
    pub user: Option<UserProfile>,
    pub is_loading: bool,
}

impl SessionState {
    /// State at startup, before the first check
    pub fn initial() -> Self {
        Self {
            access_token: None,
            is_authenticated: false,
            user: None,
            is_loading: true,
        }
    }

    /// Settled, signed out
    pub fn unauthenticated() -> Self {
        Self {
            is_loading: false,
            ..Self::initial()
        }
    }

    /// Settled, signed in
    pub fn authenticated(access_token: String, user: UserProfile) -> Self {
        Self {
            access_token: Some(access_token),
            is_authenticated: true,
            user: Some(user),
            is_loading: false,
        }
    }

    /// "authenticated", "unauthenticated" or "loading"
    pub fn phase(&self) -> &'static str {
        if self.is_loading {
            "loading"
        } else if self.is_authenticated {
            "authenticated"
        } else {
            "unauthenticated"
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Things that happen to a session, broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum SessionEvent {
    /// Signed in with the authoritative profile
    Authenticated { username: String },
    /// Signed in with caller-supplied data because the profile fetch failed
    Degraded { username: String },
    /// A new access token was obtained and stored
    TokenRefreshed,
    /// A background refresh failed; the session is left as is
    RefreshFailed { reason: String },
    /// Signed out; consumers should navigate to `redirect_to`
    LoggedOut { redirect_to: String },
}
