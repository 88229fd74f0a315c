use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Email/password pair submitted to the credential adapter.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }

    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Roles the web panel knows about. Tokens may carry others (attendant
/// roles, future ones); those stay as raw strings on `SessionUser::role`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Avaliador,
    Proprietario,
}

impl FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "AVALIADOR" => Ok(Role::Avaliador),
            "PROPRIETARIO" => Ok(Role::Proprietario),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// User object embedded in the signed session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Passed through as issued; see [`SessionUser::known_role`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl SessionUser {
    pub fn known_role(&self) -> Option<Role> {
        self.role.as_deref().and_then(|r| r.parse().ok())
    }
}

/// Session object surfaced to the console.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: SessionUser,
    pub access_token: String,
    pub refresh_token: String,
    pub expires: DateTime<Utc>,
}

impl Session {
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }
}

/// Query string delivered to the console after the OAuth round trip:
/// `?token=...` on success or `?error=...` on failure.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct OAuthCallbackQuery {
    pub token: Option<String>,
    pub error: Option<String>,
}
