use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

pub use crate::auth::repo_types::{NewUser, Role, User};

#[derive(Debug, thiserror::Error)]
pub enum InsertUserError {
    #[error("username or email already registered")]
    Duplicate,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for InsertUserError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => InsertUserError::Duplicate,
            _ => InsertUserError::Other(anyhow::Error::new(e).context("insert user")),
        }
    }
}

/// Persistence collaborator owning user records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Looks a user up by email or username. An exact email match wins over
    /// a username match.
    async fn find_by_identifier(&self, identifier: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Inserts atomically; a clash on email or username yields `Duplicate`.
    async fn insert(&self, user: NewUser) -> Result<User, InsertUserError>;
    async fn update_last_logout(&self, id: Uuid, at: OffsetDateTime) -> anyhow::Result<()>;
}

const USER_COLUMNS: &str = "id, full_name, username, email, password_hash, phone, country, \
                            role, terms_accepted, last_logout_at, created_at";

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_identifier(&self, identifier: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE email = lower($1) OR lower(username) = lower($1)
            ORDER BY (email = lower($1)) DESC
            LIMIT 1
            "#
        ))
        .bind(identifier)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, InsertUserError> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users
                (id, full_name, username, email, password_hash, phone, country, role, terms_accepted)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.full_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(&user.country)
        .bind(Role::Student)
        .bind(user.terms_accepted)
        .fetch_one(&self.db)
        .await?;
        Ok(created)
    }

    async fn update_last_logout(&self, id: Uuid, at: OffsetDateTime) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET last_logout_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
