//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::auth::models::UserProfile;
use crate::auth::token::DecodedToken;
use crate::session::SessionState;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Format a session phase as a colored string
pub fn format_phase(phase: &str) -> String {
    match phase {
        "authenticated" => phase.green().to_string(),
        "unauthenticated" => phase.red().to_string(),
        "loading" => phase.yellow().to_string(),
        _ => phase.to_string(),
    }
}

/// Print the session state with the user's profile
pub fn print_session(state: &SessionState) {
    println!("{} {}", "Session:".bold(), format_phase(state.phase()));

    match &state.user {
        Some(user) => print_profile_table(user),
        None => info("Not signed in. Run 'portal-session login --username <name>'"),
    }
}

/// Print a table with the user's profile
pub fn print_profile_table(user: &UserProfile) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Field").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    let groups = user
        .groups
        .iter()
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let rows = [
        ("ID", user.id.to_string()),
        ("Username", user.username.clone()),
        ("Name", user.display_name()),
        ("Email", user.email.clone()),
        ("Phone", user.phone.clone().unwrap_or_else(|| "-".to_string())),
        ("Role", user.get_role().to_string()),
        ("Groups", if groups.is_empty() { "-".to_string() } else { groups }),
        ("Avatar", user.avatar.clone().unwrap_or_else(|| "-".to_string())),
    ];

    for (field, value) in rows {
        table.add_row(vec![Cell::new(field), Cell::new(value)]);
    }

    println!("{table}");
}

/// Print decoded token claims
pub fn print_decoded(decoded: &DecodedToken) {
    warn("Claims are NOT verified; do not trust them for identity");

    if let Some(meta) = &decoded.metadata {
        println!("  {} {}", "Algorithm:".bold(), meta.alg);
    }
    if let Some(subject) = decoded.claims.subject() {
        println!("  {} {}", "Subject:".bold(), subject);
    }

    let expires = decoded
        .claims
        .expires_at()
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "invalid".to_string());
    let remaining = decoded.claims.exp.saturating_sub(chrono::Utc::now().timestamp());
    let remaining = if remaining > 0 {
        format!("{}s left", remaining).green()
    } else {
        "expired".red()
    };
    println!("  {} {} ({})", "Expires:".bold(), expires, remaining);
}
