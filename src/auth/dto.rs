use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::{Role, User};

/// Request body for user registration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub terms_accepted: bool,
    /// Accepted so old forms keep working, never read: registration always
    /// creates a student.
    #[serde(default)]
    #[allow(dead_code)]
    pub role: Option<String>,
}

/// Request body for login. Forms may send the identifier as `identifier`,
/// `email` or `username`; absent fields deserialize empty so the gate
/// reports them as missing.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// First non-blank of `identifier`, `email`, `username`.
    pub fn identifier(&self) -> &str {
        [&self.identifier, &self.email, &self.username]
            .into_iter()
            .find(|v| !v.trim().is_empty())
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub redirect_to: &'static str,
    pub role: Role,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
