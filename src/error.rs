//! Error types for portal-session

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found. Run 'portal-session init' first.")]
    ConfigNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Portal API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error means the caller has to sign in again
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Error::NotAuthenticated => true,
            Error::Status { status, .. } => matches!(status, 401 | 403),
            Error::Http(e) => e
                .status()
                .map(|s| s.as_u16() == 401 || s.as_u16() == 403)
                .unwrap_or(false),
            _ => false,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
