use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Github,
    Google,
}

impl OAuthProvider {
    /// The provider's path segment in OAuth routes.
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Github => "github",
            OAuthProvider::Google => "google",
        }
    }
}

impl std::fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider the deployment has configured, with its reachability as
/// probed by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthProviderInfo {
    pub name: String,
    pub display_name: String,
    pub login_url: String,
    pub status: Option<String>,
    pub message: Option<String>,
}

/// A third-party account linked to the signed-in user.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthAccount {
    pub provider: OAuthProvider,
    pub provider_username: Option<String>,
    pub created_at: NaiveDateTime,
}
