//! HTTP client for the portal API

use crate::api::endpoints;
use crate::api::jar::SessionJar;
use crate::auth::models::{
    LoginRequest, LoginResponse, RefreshResponse, RegisterConfirmRequest, RegisterInitRequest,
    UserProfile,
};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The remote calls the session manager depends on
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange the server-held refresh cookie for a new access token.
    ///
    /// One request, no retries. Persisting the result is up to the caller.
    async fn refresh_access_token(&self) -> Result<String>;

    /// Fetch the profile of the user owning `access_token`
    async fn fetch_current_user(&self, access_token: &str) -> Result<UserProfile>;

    /// Invalidate the session server-side
    async fn logout(&self, access_token: &str) -> Result<()>;
}

/// reqwest-backed portal API client
///
/// Cookies set by the server (the httponly refresh credential) are kept in
/// a [`SessionJar`] and sent back automatically.
#[derive(Clone)]
pub struct HttpAuthApi {
    http: Client,
    base_url: String,
    jar: Arc<SessionJar>,
}

impl HttpAuthApi {
    /// Create a client from the `[api]` config section with an in-memory jar
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Self::with_jar(config, Arc::new(SessionJar::in_memory()))
    }

    /// Create a client that keeps its cookies in `jar`
    pub fn with_jar(config: &ApiConfig, jar: Arc<SessionJar>) -> Result<Self> {
        let mut builder = Client::builder().cookie_provider(jar.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.clone(),
            jar,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn jar(&self) -> &SessionJar {
        &self.jar
    }

    fn url(&self, path: &str) -> String {
        endpoints::url(&self.base_url, path)
    }

    /// Exchange a username and password for an access token
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        debug!("Logging in as {}", request.username);
        let response = self
            .http
            .post(self.url(endpoints::LOGIN))
            .json(request)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Start registration; the server emails a confirmation code
    pub async fn register_init(&self, request: &RegisterInitRequest) -> Result<serde_json::Value> {
        let response = self
            .http
            .post(self.url(endpoints::REGISTER_INIT))
            .json(request)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Finish registration with the emailed code
    pub async fn register_confirm(&self, request: &RegisterConfirmRequest) -> Result<LoginResponse> {
        let response = self
            .http
            .post(self.url(endpoints::REGISTER_CONFIRM))
            .json(request)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn refresh_access_token(&self) -> Result<String> {
        debug!("Refreshing access token");
        let response = self.http.post(self.url(endpoints::TOKEN_REFRESH)).send().await?;
        let body: RefreshResponse = check_status(response).await?.json().await?;
        Ok(body.access)
    }

    async fn fetch_current_user(&self, access_token: &str) -> Result<UserProfile> {
        let response = self
            .http
            .get(self.url(endpoints::CURRENT_USER))
            .bearer_auth(access_token)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn logout(&self, access_token: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url(endpoints::LOGOUT))
            .bearer_auth(access_token)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Turn a non-2xx response into `Error::Status`
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let body = if body.len() > 500 {
        let mut end = 500;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body
    };

    Err(Error::Status {
        status: status.as_u16(),
        body,
    })
}
