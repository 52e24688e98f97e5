use std::sync::Arc;

use anyhow::Context;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use crate::auth::{
    context::RequestContext,
    dto::RegisterRequest,
    errors::{GateError, ValidationKind},
    landing::Landing,
    password::{hash_password, verify_password_or_dummy, warm_up},
    repo::{InsertUserError, NewUser, User, UserRepository},
    session::{Session, SessionPolicy, SessionStore},
    validation::{normalize_identifier, sanitize, validate_registration},
};

/// A resolved, unexpired session together with the user it belongs to.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub session: Session,
    pub user: User,
}

impl Authenticated {
    pub fn landing(&self) -> Landing {
        Landing::for_role(self.session.role)
    }
}

#[derive(Debug)]
pub struct LoginOutcome {
    /// Raw token for the session cookie.
    pub token: String,
    pub user: User,
    pub landing: Landing,
}

/// Owns session lifecycle and credential checks. One instance per process,
/// shared through `AppState`.
pub struct SessionGate {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionStore>,
    policy: SessionPolicy,
}

impl SessionGate {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionStore>,
        policy: SessionPolicy,
    ) -> Self {
        warm_up();
        Self {
            users,
            sessions,
            policy,
        }
    }

    /// Resolves the request's session. Expired sessions and sessions whose
    /// user no longer exists count as absent. Read-only.
    pub async fn current_session(
        &self,
        ctx: &RequestContext,
    ) -> Result<Option<Authenticated>, GateError> {
        let Some(token) = ctx.session_token.as_deref() else {
            return Ok(None);
        };
        let Some(session) = self.sessions.resolve(token).await? else {
            return Ok(None);
        };
        if session.is_expired(OffsetDateTime::now_utc(), &self.policy) {
            debug!(user_id = %session.user_id, "session expired");
            return Ok(None);
        }
        let Some(user) = self.users.find_by_id(session.user_id).await? else {
            debug!(user_id = %session.user_id, "session points at a deleted user");
            return Ok(None);
        };
        Ok(Some(Authenticated { session, user }))
    }

    pub async fn is_authenticated(&self, ctx: &RequestContext) -> Result<bool, GateError> {
        Ok(self.current_session(ctx).await?.is_some())
    }

    /// Verifies credentials and opens a fresh session. A token already
    /// carried by the request is destroyed first.
    #[instrument(skip_all)]
    pub async fn login(
        &self,
        ctx: &RequestContext,
        identifier: &str,
        password: &str,
    ) -> Result<LoginOutcome, GateError> {
        let identifier = normalize_identifier(identifier);
        if identifier.is_empty() || password.is_empty() {
            return Err(ValidationKind::MissingField.into());
        }

        let user = self.users.find_by_identifier(&identifier).await?;

        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let plain = password.to_owned();
        let verified = tokio::task::spawn_blocking(move || {
            verify_password_or_dummy(&plain, stored_hash.as_deref())
        })
        .await
        .context("password verification task")??;

        let user = match user {
            Some(u) if verified => u,
            _ => {
                warn!("login rejected");
                return Err(GateError::InvalidCredentials);
            }
        };

        if let Some(previous) = ctx.session_token.as_deref() {
            self.sessions.destroy(previous).await?;
        }
        match self
            .sessions
            .purge_expired(&self.policy, OffsetDateTime::now_utc())
            .await
        {
            Ok(0) => {}
            Ok(n) => debug!(purged = n, "expired sessions purged"),
            Err(e) => warn!(error = %e, "purging expired sessions failed"),
        }

        let token = self.sessions.create(user.id, user.role).await?;
        let landing = Landing::for_role(user.role);
        info!(user_id = %user.id, role = %user.role, "user logged in");
        Ok(LoginOutcome {
            token,
            user,
            landing,
        })
    }

    /// Validates, hashes and stores a new student account.
    #[instrument(skip_all)]
    pub async fn register(&self, mut form: RegisterRequest) -> Result<User, GateError> {
        sanitize(&mut form);
        if let Err(kind) = validate_registration(&form) {
            warn!(reason = %kind, "registration rejected");
            return Err(kind.into());
        }

        // Cheap early exit before the slow hash; the insert stays authoritative.
        if self.users.find_by_identifier(&form.email).await?.is_some()
            || self.users.find_by_identifier(&form.username).await?.is_some()
        {
            warn!("registration rejected: duplicate user");
            return Err(GateError::Conflict);
        }

        let plain = std::mem::take(&mut form.password);
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&plain))
            .await
            .context("password hashing task")??;

        let new_user = NewUser {
            full_name: form.full_name,
            username: form.username,
            email: form.email,
            password_hash,
            phone: form.phone,
            country: form.country,
            terms_accepted: form.terms_accepted,
        };

        let user = match self.users.insert(new_user).await {
            Ok(u) => u,
            Err(InsertUserError::Duplicate) => {
                warn!("registration rejected: duplicate user");
                return Err(GateError::Conflict);
            }
            Err(InsertUserError::Other(e)) => return Err(e.into()),
        };

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Records the logout time (best-effort) and destroys the session.
    #[instrument(skip_all)]
    pub async fn logout(&self, ctx: &RequestContext) -> Result<(), GateError> {
        let Some(token) = ctx.session_token.as_deref() else {
            return Ok(());
        };

        match self.sessions.resolve(token).await {
            Ok(Some(session)) => {
                if let Err(e) = self
                    .users
                    .update_last_logout(session.user_id, OffsetDateTime::now_utc())
                    .await
                {
                    warn!(error = %e, user_id = %session.user_id, "recording last logout failed");
                }
                info!(user_id = %session.user_id, "user logged out");
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "resolving session on logout failed"),
        }

        self.sessions.destroy(token).await?;
        Ok(())
    }

    /// Moves the idle clock of the request's session forward.
    pub async fn touch(&self, ctx: &RequestContext) -> Result<(), GateError> {
        if let Some(token) = ctx.session_token.as_deref() {
            self.sessions.touch(token, OffsetDateTime::now_utc()).await?;
        }
        Ok(())
    }
}
