//! In-memory collaborators for unit and router tests.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::auth::repo::{InsertUserError, NewUser, Role, User, UserRepository};

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<Vec<User>>,
    pub fail_last_logout: AtomicBool,
}

impl MemoryUserRepository {
    /// Stores a user directly, bypassing registration (and its role rule).
    pub async fn seed(
        &self,
        full_name: &str,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> User {
        let user = User {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            username: username.into(),
            email: email.to_lowercase(),
            password_hash: hash_password(password).expect("hash"),
            phone: "5550000".into(),
            country: "MX".into(),
            role,
            terms_accepted: true,
            last_logout_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        self.users.write().await.push(user.clone());
        user
    }

    pub async fn get(&self, id: Uuid) -> Option<User> {
        self.users.read().await.iter().find(|u| u.id == id).cloned()
    }

    pub async fn remove(&self, id: Uuid) {
        self.users.write().await.retain(|u| u.id != id);
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_identifier(&self, identifier: &str) -> anyhow::Result<Option<User>> {
        let needle = identifier.to_lowercase();
        let users = self.users.read().await;
        let found = users
            .iter()
            .find(|u| u.email == needle)
            .or_else(|| users.iter().find(|u| u.username.to_lowercase() == needle))
            .cloned();
        Ok(found)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.get(id).await)
    }

    async fn insert(&self, user: NewUser) -> Result<User, InsertUserError> {
        let mut users = self.users.write().await;
        let clash = users.iter().any(|u| {
            u.email == user.email.to_lowercase()
                || u.username.to_lowercase() == user.username.to_lowercase()
        });
        if clash {
            return Err(InsertUserError::Duplicate);
        }
        let created = User {
            id: Uuid::new_v4(),
            full_name: user.full_name,
            username: user.username,
            email: user.email.to_lowercase(),
            password_hash: user.password_hash,
            phone: user.phone,
            country: user.country,
            role: Role::Student,
            terms_accepted: user.terms_accepted,
            last_logout_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update_last_logout(&self, id: Uuid, at: OffsetDateTime) -> anyhow::Result<()> {
        if self.fail_last_logout.load(Ordering::SeqCst) {
            anyhow::bail!("users table is read-only");
        }
        if let Some(u) = self.users.write().await.iter_mut().find(|u| u.id == id) {
            u.last_logout_at = Some(at);
        }
        Ok(())
    }
}

/// Stands in for a database that cannot be reached.
pub struct UnavailableUserRepository;

#[async_trait]
impl UserRepository for UnavailableUserRepository {
    async fn find_by_identifier(&self, _identifier: &str) -> anyhow::Result<Option<User>> {
        anyhow::bail!("database unreachable")
    }

    async fn find_by_id(&self, _id: Uuid) -> anyhow::Result<Option<User>> {
        anyhow::bail!("database unreachable")
    }

    async fn insert(&self, _user: NewUser) -> Result<User, InsertUserError> {
        Err(anyhow::anyhow!("database unreachable").into())
    }

    async fn update_last_logout(&self, _id: Uuid, _at: OffsetDateTime) -> anyhow::Result<()> {
        anyhow::bail!("database unreachable")
    }
}
