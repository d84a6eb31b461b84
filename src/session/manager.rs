//! Session orchestration
//!
//! [`SessionManager`] owns the session state machine:
//!
//! ```text
//! loading ──▶ authenticated ◀──▶ unauthenticated
//!    └──────────────────────────────▲
//! ```
//!
//! It decides whether the stored access token can be reused, refreshes it
//! through [`AuthApi`] when it cannot, hydrates the user profile, and runs the
//! expiry [`Watchdog`] for as long as the session is authenticated.

use crate::api::AuthApi;
use crate::auth::models::{PartialUser, UserProfile};
use crate::auth::store::TokenStore;
use crate::auth::token::{is_token_expired_with_leeway, seconds_remaining};
use crate::config::SessionConfig;
use crate::error::Result;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::state::{SessionEvent, SessionState};
use super::watchdog::Watchdog;

const EVENT_CAPACITY: usize = 32;

struct Inner {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn TokenStore>,
    config: SessionConfig,
    state: watch::Sender<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    /// Serializes refresh calls so concurrent callers share one result
    refresh_lock: tokio::sync::Mutex<()>,
    watchdog: Mutex<Option<Watchdog>>,
}

/// Client-side session for the portal API
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Create a manager in the loading state
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn TokenStore>, config: SessionConfig) -> Self {
        let (state, _) = watch::channel(SessionState::initial());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                api,
                store,
                config,
                state,
                events,
                refresh_lock: tokio::sync::Mutex::new(()),
                watchdog: Mutex::new(None),
            }),
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Receive session events
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated
    }

    /// Whether the expiry watchdog is scheduled
    pub fn watchdog_running(&self) -> bool {
        self.lock_watchdog()
            .as_ref()
            .map(Watchdog::is_running)
            .unwrap_or(false)
    }

    /// Settle the session from whatever token is stored
    ///
    /// Never fails: any problem along the way clears the stored token and
    /// leaves the session unauthenticated.
    pub async fn check_auth(&self) -> SessionState {
        self.set_loading();

        if self.inner.store.get().is_none() {
            debug!("No stored access token");
            self.settle_unauthenticated();
            return self.state();
        }

        match self.authenticate_stored().await {
            Ok((token, user)) => self.settle_authenticated(token, user, false),
            Err(e) => {
                info!("Stored session is no longer valid: {}", e);
                self.clear_token();
                self.settle_unauthenticated();
            }
        }

        self.state()
    }

    async fn authenticate_stored(&self) -> Result<(String, UserProfile)> {
        let token = self.get_valid_access_token().await?;
        let user = self.inner.api.fetch_current_user(&token).await?;
        Ok((token, user))
    }

    /// Start a session from a freshly issued access token
    ///
    /// If the profile fetch fails and `partial_user` was supplied, the session
    /// is authenticated with that data instead. Without it the error is
    /// returned and the session ends up unauthenticated.
    pub async fn login(&self, access_token: &str, partial_user: Option<PartialUser>) -> Result<()> {
        self.inner.store.set(access_token)?;
        self.set_loading();

        match self.inner.api.fetch_current_user(access_token).await {
            Ok(mut user) => {
                if let Some(avatar) = partial_user.and_then(|p| p.avatar) {
                    user.avatar = Some(avatar);
                }
                self.settle_authenticated(access_token.to_string(), user, false);
                Ok(())
            }
            Err(e) => match partial_user {
                Some(partial) => {
                    warn!("Profile fetch failed during login, using supplied user data: {}", e);
                    self.settle_authenticated(access_token.to_string(), partial.into_profile(), true);
                    Ok(())
                }
                None => {
                    warn!("Profile fetch failed during login: {}", e);
                    self.clear_token();
                    self.settle_unauthenticated();
                    Err(e)
                }
            },
        }
    }

    /// End the session
    ///
    /// The remote logout is best effort; local state is always reset.
    pub async fn logout(&self) {
        if let Some(token) = self.inner.store.get() {
            if let Err(e) = self.inner.api.logout(&token).await {
                warn!("Remote logout failed: {}", e);
            }
        }

        self.clear_token();
        self.settle_unauthenticated();
        self.emit(SessionEvent::LoggedOut {
            redirect_to: self.inner.config.home_route.clone(),
        });
        info!("Logged out");
    }

    /// Authorization header carrying a valid access token
    pub async fn get_auth_header(&self) -> Result<HeaderMap> {
        let token = self.get_valid_access_token().await?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token))?);
        Ok(headers)
    }

    /// Stored token if still fresh, otherwise a newly refreshed one
    pub async fn get_valid_access_token(&self) -> Result<String> {
        if let Some(token) = self.fresh_stored_token() {
            return Ok(token);
        }

        let _guard = self.inner.refresh_lock.lock().await;
        // Someone else may have refreshed while we waited
        if let Some(token) = self.fresh_stored_token() {
            return Ok(token);
        }

        self.refresh_and_store().await
    }

    /// One watchdog pass: refresh if the stored token is close to expiry
    pub async fn run_expiry_check(&self) {
        if !self.is_authenticated() {
            return;
        }

        let threshold = self.inner.config.refresh_threshold_secs;
        if !self.stored_token_expiring(threshold) {
            return;
        }

        let _guard = self.inner.refresh_lock.lock().await;
        if !self.stored_token_expiring(threshold) {
            return;
        }

        info!("Access token expires within {}s, refreshing", threshold);
        if let Err(e) = self.refresh_and_store().await {
            warn!("Background token refresh failed: {}", e);
            self.emit(SessionEvent::RefreshFailed {
                reason: e.to_string(),
            });
        }
    }

    /// Stop background work
    pub fn shutdown(&self) {
        self.stop_watchdog();
    }

    fn fresh_stored_token(&self) -> Option<String> {
        let leeway = self.inner.config.leeway_secs;
        self.inner
            .store
            .get()
            .filter(|token| !is_token_expired_with_leeway(token, leeway))
    }

    fn stored_token_expiring(&self, threshold: i64) -> bool {
        match self.inner.store.get().as_deref().and_then(seconds_remaining) {
            Some(remaining) => {
                debug!("Access token valid for {}s", remaining);
                remaining < threshold
            }
            None => false,
        }
    }

    async fn refresh_and_store(&self) -> Result<String> {
        let token = self.inner.api.refresh_access_token().await?;
        self.inner.store.set(&token)?;

        self.inner.state.send_if_modified(|state| {
            if state.is_authenticated {
                state.access_token = Some(token.clone());
                true
            } else {
                false
            }
        });
        self.emit(SessionEvent::TokenRefreshed);
        debug!("Access token refreshed");
        Ok(token)
    }

    fn clear_token(&self) {
        if let Err(e) = self.inner.store.clear() {
            warn!("Failed to clear stored access token: {}", e);
        }
    }

    fn set_loading(&self) {
        self.inner.state.send_if_modified(|state| {
            let changed = !state.is_loading;
            state.is_loading = true;
            changed
        });
    }

    fn settle_authenticated(&self, token: String, user: UserProfile, degraded: bool) {
        let username = user.username.clone();
        self.inner
            .state
            .send_replace(SessionState::authenticated(token, user));
        self.start_watchdog();

        info!("Authenticated as {}", username);
        self.emit(if degraded {
            SessionEvent::Degraded { username }
        } else {
            SessionEvent::Authenticated { username }
        });
    }

    fn settle_unauthenticated(&self) {
        self.inner.state.send_replace(SessionState::unauthenticated());
        self.stop_watchdog();
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    fn lock_watchdog(&self) -> std::sync::MutexGuard<'_, Option<Watchdog>> {
        self.inner.watchdog.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn start_watchdog(&self) {
        let mut slot = self.lock_watchdog();
        if slot.as_ref().is_some_and(Watchdog::is_running) {
            return;
        }

        let period = Duration::from_secs(self.inner.config.check_interval_secs.max(1));
        let weak = Arc::downgrade(&self.inner);
        *slot = Some(Watchdog::spawn(period, move || {
            weak.upgrade().map(|inner| async move {
                SessionManager { inner }.run_expiry_check().await;
            })
        }));
    }

    fn stop_watchdog(&self) {
        if let Some(watchdog) = self.lock_watchdog().take() {
            watchdog.stop();
            debug!("Watchdog stopped");
        }
    }
}
