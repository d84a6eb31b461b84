//! portal-session - access-token sessions for the institution portal API
//!
//! The portal keeps a short-lived access token in a cookie and lets the server
//! hold a refresh credential. This crate decodes the access token to time
//! refreshes, exchanges the refresh credential for new tokens, hydrates the
//! signed-in user's profile and keeps the session fresh in the background.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod session;

pub use api::{AuthApi, HttpAuthApi, SessionJar};
pub use config::Config;
pub use error::{Error, Result};
pub use session::{SessionEvent, SessionManager, SessionState};
