//! Shared fixtures: a scripted portal API and token minting

#![allow(dead_code)]

pub mod stub;

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use portal_session::auth::{MemoryTokenStore, UserProfile};
use portal_session::config::SessionConfig;
use portal_session::{AuthApi, Error, Result, SessionManager};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mint a signed token expiring `exp_in_secs` from now
pub fn mint_token(exp_in_secs: i64) -> String {
    mint_token_at(chrono::Utc::now().timestamp() + exp_in_secs)
}

/// Mint a signed token with an absolute `exp`
pub fn mint_token_at(exp: i64) -> String {
    let claims = serde_json::json!({
        "token_type": "access",
        "exp": exp,
        "iat": exp.saturating_sub(300),
        "jti": format!("jti-{}", exp),
        "user_id": 1,
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret"))
        .expect("Failed to mint token")
}

pub fn student_profile() -> UserProfile {
    serde_json::from_value(serde_json::json!({
        "id": 1,
        "username": "a",
        "email": "a@example.edu",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "role": "student",
        "is_active": true,
        "groups": [{ "id": 3, "name": "CS-101" }],
    }))
    .expect("valid profile")
}

/// Portal API double that records calls
pub struct MockApi {
    pub refresh_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    refresh_expiry_secs: Mutex<Option<i64>>,
    profile: Mutex<Option<UserProfile>>,
    logout_fails: bool,
    refresh_delay: Option<Duration>,
}

impl MockApi {
    /// Every call fails until configured otherwise
    pub fn new() -> Self {
        Self {
            refresh_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            refresh_expiry_secs: Mutex::new(None),
            profile: Mutex::new(None),
            logout_fails: false,
            refresh_delay: None,
        }
    }

    /// Refresh succeeds with a token valid for `secs`
    pub fn with_refresh(self, secs: i64) -> Self {
        *self.refresh_expiry_secs.lock().unwrap() = Some(secs);
        self
    }

    pub fn with_profile(self, profile: UserProfile) -> Self {
        *self.profile.lock().unwrap() = Some(profile);
        self
    }

    pub fn with_failing_logout(mut self) -> Self {
        self.logout_fails = true;
        self
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn profile_fetches(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    pub fn logouts(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for MockApi {
    async fn refresh_access_token(&self) -> Result<String> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }

        let expiry = *self.refresh_expiry_secs.lock().unwrap();
        match expiry {
            Some(secs) => Ok(mint_token(secs)),
            None => Err(Error::Status {
                status: 401,
                body: r#"{"detail":"Token is invalid or expired"}"#.to_string(),
            }),
        }
    }

    async fn fetch_current_user(&self, _access_token: &str) -> Result<UserProfile> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let profile = self.profile.lock().unwrap().clone();
        profile.ok_or_else(|| Error::Status {
            status: 502,
            body: "Bad Gateway".to_string(),
        })
    }

    async fn logout(&self, _access_token: &str) -> Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.logout_fails {
            return Err(Error::Other("connection reset".to_string()));
        }
        Ok(())
    }
}

/// Manager wired to `api` and an in-memory cookie store
pub fn session_with(api: MockApi) -> (SessionManager, Arc<MockApi>, Arc<MemoryTokenStore>) {
    let api = Arc::new(api);
    let store = Arc::new(MemoryTokenStore::default());
    let session = SessionManager::new(api.clone(), store.clone(), SessionConfig::default());
    (session, api, store)
}
