use std::collections::HashMap;

use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::auth::repo_types::Role;
use crate::auth::session::{generate_token, token_digest, Session, SessionPolicy, SessionStore};

/// Sessions persisted in the `sessions` table, keyed by token digest.
#[derive(Clone)]
pub struct PgSessionStore {
    db: PgPool,
}

impl PgSessionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, user_id: Uuid, role: Role) -> anyhow::Result<String> {
        let token = generate_token();
        let now = OffsetDateTime::now_utc();
        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, user_id, role, authenticated_at, last_seen_at)
            VALUES ($1, $2, $3, $4, $4)
            "#,
        )
        .bind(token_digest(&token))
        .bind(user_id)
        .bind(role)
        .bind(now)
        .execute(&self.db)
        .await?;
        debug!(user_id = %user_id, role = %role, "session created");
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> anyhow::Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT user_id, role, authenticated_at, last_seen_at
            FROM sessions
            WHERE token_hash = $1
            "#,
        )
        .bind(token_digest(token))
        .fetch_optional(&self.db)
        .await?;
        Ok(session)
    }

    async fn touch(&self, token: &str, at: OffsetDateTime) -> anyhow::Result<()> {
        sqlx::query("UPDATE sessions SET last_seen_at = $2 WHERE token_hash = $1")
            .bind(token_digest(token))
            .bind(at)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn destroy(&self, token: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_digest(token))
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self, policy: &SessionPolicy, now: OffsetDateTime) -> anyhow::Result<u64> {
        let res = sqlx::query(
            "DELETE FROM sessions WHERE authenticated_at <= $1 OR last_seen_at <= $2",
        )
        .bind(now - policy.absolute)
        .bind(now - policy.idle)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected())
    }
}

/// In-process session store. Sessions do not survive a restart.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: Uuid, role: Role) -> anyhow::Result<String> {
        let token = generate_token();
        let session = Session::new(user_id, role, OffsetDateTime::now_utc());
        self.sessions.write().await.insert(token_digest(&token), session);
        debug!(user_id = %user_id, role = %role, "session created");
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> anyhow::Result<Option<Session>> {
        Ok(self.sessions.read().await.get(&token_digest(token)).cloned())
    }

    async fn touch(&self, token: &str, at: OffsetDateTime) -> anyhow::Result<()> {
        if let Some(session) = self.sessions.write().await.get_mut(&token_digest(token)) {
            session.last_seen_at = at;
        }
        Ok(())
    }

    async fn destroy(&self, token: &str) -> anyhow::Result<()> {
        self.sessions.write().await.remove(&token_digest(token));
        Ok(())
    }

    async fn purge_expired(&self, policy: &SessionPolicy, now: OffsetDateTime) -> anyhow::Result<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now, policy));
        Ok((before - sessions.len()) as u64)
    }
}
