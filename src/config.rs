use anyhow::Context;
use serde::Deserialize;

/// Upper bound for either session timeout: one year.
pub const MAX_SESSION_MINUTES: i64 = 366 * 24 * 60;

/// Where server-side session records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for SessionBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("unknown SESSION_STORE value: {other}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub idle_minutes: i64,
    pub absolute_minutes: i64,
    pub backend: SessionBackend,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "edugate_session".into(),
            cookie_secure: false,
            idle_minutes: 30,
            absolute_minutes: 8 * 60,
            backend: SessionBackend::Postgres,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let defaults = SessionConfig::default();
        let session = SessionConfig {
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or(defaults.cookie_name),
            cookie_secure: match std::env::var("SESSION_COOKIE_SECURE") {
                Ok(v) => parse_flag("SESSION_COOKIE_SECURE", &v)?,
                Err(_) => defaults.cookie_secure,
            },
            idle_minutes: match std::env::var("SESSION_IDLE_MINUTES") {
                Ok(v) => parse_minutes("SESSION_IDLE_MINUTES", &v)?,
                Err(_) => defaults.idle_minutes,
            },
            absolute_minutes: match std::env::var("SESSION_ABSOLUTE_MINUTES") {
                Ok(v) => parse_minutes("SESSION_ABSOLUTE_MINUTES", &v)?,
                Err(_) => defaults.absolute_minutes,
            },
            backend: match std::env::var("SESSION_STORE") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.backend,
            },
        };
        Ok(Self {
            database_url,
            session,
        })
    }
}

/// Session timeouts must be positive and at most `MAX_SESSION_MINUTES`.
fn parse_minutes(key: &str, raw: &str) -> anyhow::Result<i64> {
    let minutes: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of minutes, got {raw:?}"))?;
    if minutes <= 0 || minutes > MAX_SESSION_MINUTES {
        anyhow::bail!("{key} must be between 1 and {MAX_SESSION_MINUTES}, got {minutes}");
    }
    Ok(minutes)
}

fn parse_flag(key: &str, raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{key} must be a boolean, got {other:?}"),
    }
}
