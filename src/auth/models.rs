//! Portal user and credential models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Roles known to the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Administrator - user and content management
    Admin,
    /// Teaching staff
    Teacher,
    /// Enrolled student
    Student,
    /// Prospective student going through admissions
    Applicant,
    /// Signed in without a role assigned yet
    Guest,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Teacher => write!(f, "teacher"),
            UserRole::Student => write!(f, "student"),
            UserRole::Applicant => write!(f, "applicant"),
            UserRole::Guest => write!(f, "guest"),
        }
    }
}

/// A group the user belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroup {
    pub id: i64,
    pub name: String,
}

/// Authenticated user's profile as returned by `GET /api/users/me/`
///
/// Read-only on the client; replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Role string as sent by the server
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub groups: Vec<UserGroup>,
    #[serde(default)]
    pub avatar: Option<String>,
}

fn default_role() -> String {
    UserRole::Guest.to_string()
}

impl UserProfile {
    /// Get user role
    pub fn get_role(&self) -> UserRole {
        match self.role.as_str() {
            "admin" => UserRole::Admin,
            "teacher" => UserRole::Teacher,
            "student" => UserRole::Student,
            "applicant" => UserRole::Applicant,
            _ => UserRole::Guest,
        }
    }

    /// Check if user is admin
    pub fn is_admin(&self) -> bool {
        self.get_role() == UserRole::Admin || self.is_superuser
    }

    /// First and last name, or the username when both are blank
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Caller-supplied user data, e.g. from an OAuth redirect
///
/// Used as-is when the profile endpoint cannot be reached during login.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_staff: Option<bool>,
    #[serde(default)]
    pub is_superuser: Option<bool>,
    #[serde(default)]
    pub groups: Option<Vec<UserGroup>>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl PartialUser {
    /// Fill in the gaps: role "guest", flags false, collections empty
    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.id.unwrap_or_default(),
            username: self.username.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            middle_name: self.middle_name.unwrap_or_default(),
            phone: self.phone,
            role: self.role.unwrap_or_else(default_role),
            is_active: self.is_active.unwrap_or(false),
            is_staff: self.is_staff.unwrap_or(false),
            is_superuser: self.is_superuser.unwrap_or(false),
            groups: self.groups.unwrap_or_default(),
            avatar: self.avatar,
        }
    }
}

/// Login credentials for `POST /api/login/`
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body returned by the credential exchange endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    #[serde(default)]
    pub user: Option<PartialUser>,
}

/// Body returned by `POST /api/token/refresh/`
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// First step of registration: ask the server to send a confirmation code
#[derive(Debug, Serialize)]
pub struct RegisterInitRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Second step of registration: confirm with the emailed code
#[derive(Debug, Serialize)]
pub struct RegisterConfirmRequest {
    pub email: String,
    pub code: String,
}
