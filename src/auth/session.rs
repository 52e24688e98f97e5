use axum::async_trait;
use base64::{engine::general_purpose, Engine as _};
use cookie::{Cookie, SameSite};
use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::auth::repo_types::Role;
use crate::config::SessionConfig;

/// Server-held proof of a prior successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Role,
    pub authenticated_at: OffsetDateTime,
    pub last_seen_at: OffsetDateTime,
}

impl Session {
    pub fn new(user_id: Uuid, role: Role, now: OffsetDateTime) -> Self {
        Self {
            user_id,
            role,
            authenticated_at: now,
            last_seen_at: now,
        }
    }

    pub fn is_expired(&self, now: OffsetDateTime, policy: &SessionPolicy) -> bool {
        now - self.authenticated_at >= policy.absolute || now - self.last_seen_at >= policy.idle
    }
}

/// Idle and absolute lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub idle: Duration,
    pub absolute: Duration,
}

impl From<&SessionConfig> for SessionPolicy {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            idle: Duration::minutes(cfg.idle_minutes),
            absolute: Duration::minutes(cfg.absolute_minutes),
        }
    }
}

/// Session store collaborator. Every operation is atomic per token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates a session and returns the opaque token handed to the client.
    async fn create(&self, user_id: Uuid, role: Role) -> anyhow::Result<String>;
    async fn resolve(&self, token: &str) -> anyhow::Result<Option<Session>>;
    /// Refreshes the idle clock of a session.
    async fn touch(&self, token: &str, at: OffsetDateTime) -> anyhow::Result<()>;
    async fn destroy(&self, token: &str) -> anyhow::Result<()>;
    /// Drops every session the policy already considers expired.
    async fn purge_expired(&self, policy: &SessionPolicy, now: OffsetDateTime) -> anyhow::Result<u64>;
}

/// 32 bytes from the OS RNG, base64url without padding.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Key under which a token is stored. The raw token never leaves the client
/// cookie and the response that set it.
pub fn token_digest(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

/// Create a session cookie with the token
pub fn session_cookie(cfg: &SessionConfig, token: &str) -> Cookie<'static> {
    Cookie::build((cfg.cookie_name.clone(), token.to_string()))
        .http_only(true)
        .secure(cfg.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::minutes(cfg.absolute_minutes))
        .path("/")
        .build()
}

/// Create a cookie that clears the session (for logout)
pub fn removal_cookie(cfg: &SessionConfig) -> Cookie<'static> {
    Cookie::build((cfg.cookie_name.clone(), ""))
        .http_only(true)
        .secure(cfg.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(0))
        .path("/")
        .build()
}

/// Parse the session token from a Cookie header
pub fn parse_session_cookie(cookie_header: &str, cookie_name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|pair| Cookie::parse(pair.trim()).ok())
        .find(|cookie| cookie.name() == cookie_name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}
