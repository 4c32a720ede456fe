use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Moderator,
    User,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "Admin"),
            UserRole::Moderator => write!(f, "Moderator"),
            UserRole::User => write!(f, "User"),
        }
    }
}

/// Author attribution embedded in articles and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub role: UserRole,
}

impl UserRef {
    /// Full name when set, username otherwise.
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.username,
        }
    }
}

/// The signed-in user, as returned by GET /auth/me.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Payload for registering an account. `verification_code` is required
/// only when the deployment has email verification enabled.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
}

/// Which sign-in features the deployment has enabled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthConfig {
    pub email_enabled: bool,
    pub oauth_enabled: bool,
}

/// Outcome of requesting a password-change verification code. When email
/// verification is disabled server-side, no code is sent and none is
/// needed.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationCodeStatus {
    pub message: String,
    pub email_enabled: bool,
}
