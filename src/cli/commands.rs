//! CLI command implementations

use anyhow::{Context, Result};
use std::fs;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::api::{HttpAuthApi, SessionJar};
use crate::auth::models::{LoginRequest, LoginResponse, RegisterConfirmRequest, RegisterInitRequest};
use crate::auth::store::FileTokenStore;
use crate::auth::token::decode_token;
use crate::cli::{error, info, print_decoded, print_profile_table, print_session, success, warn, OutputFormat};
use crate::config::{self, Config};
use crate::session::{SessionEvent, SessionManager};

/// Initialize a new portal-session.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = std::path::Path::new(config::loader::CONFIG_FILENAME);

    if config_path.exists() {
        warn(&format!("{} already exists", config::loader::CONFIG_FILENAME));
        return Ok(());
    }

    fs::write(config_path, config::loader::default_config_content())?;

    success(&format!("Created {}", config::loader::CONFIG_FILENAME));
    info("Set [api] base_url and run 'portal-session login --username <name>'");

    Ok(())
}

/// Sign in with credentials and store the access token
pub async fn login(
    api_url: Option<String>,
    username: &str,
    password: Option<String>,
    watch: bool,
) -> Result<()> {
    let config = load_config(api_url)?;
    let (session, api) = build_session(&config)?;

    let password = match password {
        Some(password) => password,
        None => dialoguer::Password::new()
            .with_prompt(format!("Password for {}", username))
            .interact()?,
    };

    let request = LoginRequest {
        username: username.to_string(),
        password,
    };
    let response = match api.login(&request).await {
        Ok(response) => response,
        Err(e) => {
            error(&format!("Login failed: {}", e));
            return Err(e.into());
        }
    };

    start_session(&session, response).await?;

    if watch {
        keep_alive(&session).await;
    }

    session.shutdown();
    Ok(())
}

/// Create an account, confirm it with the emailed code and sign in
pub async fn register(
    api_url: Option<String>,
    email: &str,
    username: &str,
    password: Option<String>,
) -> Result<()> {
    let config = load_config(api_url)?;
    let (session, api) = build_session(&config)?;

    let password = match password {
        Some(password) => password,
        None => dialoguer::Password::new()
            .with_prompt(format!("Password for {}", username))
            .with_confirmation("Repeat password", "Passwords do not match")
            .interact()?,
    };

    let init = RegisterInitRequest {
        email: email.to_string(),
        username: username.to_string(),
        password,
    };
    if let Err(e) = api.register_init(&init).await {
        error(&format!("Registration failed: {}", e));
        return Err(e.into());
    }
    info(&format!("A confirmation code was sent to {}", email));

    let code: String = dialoguer::Input::new()
        .with_prompt("Confirmation code")
        .interact_text()?;
    let confirm = RegisterConfirmRequest {
        email: email.to_string(),
        code: code.trim().to_string(),
    };
    let response = match api.register_confirm(&confirm).await {
        Ok(response) => response,
        Err(e) => {
            error(&format!("Confirmation failed: {}", e));
            return Err(e.into());
        }
    };

    start_session(&session, response).await?;
    session.shutdown();
    Ok(())
}

async fn start_session(session: &SessionManager, response: LoginResponse) -> Result<()> {
    session
        .login(&response.access, response.user)
        .await
        .context("Signed in, but the profile could not be loaded")?;

    let state = session.state();
    if let Some(user) = &state.user {
        success(&format!("Signed in as {}", user.display_name()));
        print_profile_table(user);
    }
    Ok(())
}

/// Run the watchdog until Ctrl-C or until the session ends
async fn keep_alive(session: &SessionManager) {
    info("Keeping the session fresh; press Ctrl-C to stop");
    let mut events = session.events();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(SessionEvent::TokenRefreshed) => success("Access token refreshed"),
                Ok(SessionEvent::RefreshFailed { reason }) => {
                    warn(&format!("Background refresh failed: {}", reason))
                }
                Ok(SessionEvent::LoggedOut { .. }) | Err(RecvError::Closed) => break,
                Ok(other) => tracing::debug!("Session event: {:?}", other),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Skipped {} session events", skipped)
                }
            },
        }
    }
}

/// Check the stored session
pub async fn status(api_url: Option<String>, format: OutputFormat) -> Result<()> {
    let config = load_config(api_url)?;
    let (session, _) = build_session(&config)?;

    let state = session.check_auth().await;
    session.shutdown();

    match format {
        OutputFormat::Table => print_session(&state),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&state)?),
    }

    Ok(())
}

/// Print a valid Authorization header value
pub async fn header(api_url: Option<String>) -> Result<()> {
    let config = load_config(api_url)?;
    let (session, _) = build_session(&config)?;

    match session.get_auth_header().await {
        Ok(headers) => {
            if let Some(value) = headers.get(reqwest::header::AUTHORIZATION) {
                println!("{}", value.to_str()?);
            }
            Ok(())
        }
        Err(e) => {
            if e.is_auth_failure() {
                error("Session expired. Run 'portal-session login' again");
            } else {
                error(&format!("Failed to get a valid token: {}", e));
            }
            Err(e.into())
        }
    }
}

/// Show a token's claims
pub fn decode(token: &str) -> Result<()> {
    match decode_token(token) {
        Some(decoded) => {
            print_decoded(&decoded);
            Ok(())
        }
        None => {
            error("Not a decodable access token");
            anyhow::bail!("token could not be decoded")
        }
    }
}

/// Sign out
pub async fn logout(api_url: Option<String>) -> Result<()> {
    let config = load_config(api_url)?;
    let (session, api) = build_session(&config)?;

    session.logout().await;
    if let Err(e) = api.jar().clear() {
        warn(&format!("Could not remove {}: {}", config.cookie.jar_path.display(), e));
    }
    success("Signed out");
    Ok(())
}

fn load_config(api_url: Option<String>) -> Result<Config> {
    let mut config = config::load_config_or_default()?;
    if let Some(url) = api_url {
        config.api.base_url = url;
    }
    Ok(config)
}

fn build_session(config: &Config) -> Result<(SessionManager, Arc<HttpAuthApi>)> {
    let jar = Arc::new(SessionJar::open(&config.cookie.jar_path));
    let api = Arc::new(HttpAuthApi::with_jar(&config.api, jar)?);
    let store = Arc::new(FileTokenStore::from_config(&config.cookie));
    let session = SessionManager::new(api.clone(), store, config.session.clone());
    Ok((session, api))
}
