//! CLI interface for portal-session

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "portal-session")]
#[command(version)]
#[command(about = "Sign in to the portal API and keep the session fresh", long_about = None)]
pub struct Cli {
    /// Portal API base URL (overrides the config file)
    #[arg(long, global = true, env = "PORTAL_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default portal-session.toml configuration file
    Init,

    /// Sign in with a username and password
    Login {
        #[arg(short, long)]
        username: String,

        /// Prompted for when omitted
        #[arg(short, long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Keep the session alive until Ctrl-C
        #[arg(short, long)]
        watch: bool,
    },

    /// Create an account and sign in once the emailed code is confirmed
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        username: String,

        /// Prompted for when omitted
        #[arg(short, long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Check the stored session and show the signed-in user
    Status {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Print an Authorization header value, refreshing the token if needed
    Header,

    /// Show the claims inside an access token (not verified)
    Decode {
        /// The token to decode
        token: String,
    },

    /// Sign out and forget the stored token
    Logout,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
