use std::sync::Arc;
use std::time::Duration;

use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::auth::{
    dto::PublicUser,
    jwt::TokenCodec,
    password::PasswordHasher,
    repo::{StoreError, UserStore},
    repo_types::NewUser,
};
use crate::clock::Clock;

/// Default lifetime of a session token.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User already exists. id={id} & email={email}")]
    UserAlreadyExists { id: i64, email: String },
    /// Same value for an unknown email and for a wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        AuthError::Internal(e.into())
    }
}

/// Sign-up and login on top of a user store, a hasher and a token codec.
pub struct CredentialService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    /// Checked against when the email is unknown, so both login failures
    /// cost one full hash verification.
    dummy_hash: String,
    tokens: Arc<TokenCodec>,
    clock: Arc<dyn Clock>,
    session_ttl: Duration,
}

impl CredentialService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        tokens: Arc<TokenCodec>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let unguessable: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let dummy_hash = hasher.hash(&unguessable)?;
        Ok(Self {
            users,
            hasher,
            dummy_hash,
            tokens,
            clock,
            session_ttl: DEFAULT_SESSION_TTL,
        })
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<PublicUser, AuthError> {
        if let Some(existing) = self.users.find_by_email(email).await? {
            warn!(email = %email, user_id = existing.id, "email already registered");
            return Err(AuthError::UserAlreadyExists {
                id: existing.id,
                email: existing.email,
            });
        }

        let hasher = self.hasher.clone();
        let plain = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| AuthError::Internal(e.into()))?
            .map_err(|e| {
                error!(error = %e, "hash_password failed");
                AuthError::Internal(e)
            })?;

        let new_user = NewUser {
            email: email.to_owned(),
            password_hash,
            created_at: self.clock.now(),
        };

        let user = match self.users.save(new_user).await {
            Ok(u) => u,
            Err(StoreError::DuplicateEmail(email)) => {
                // Lost a race with a concurrent sign-up for the same email.
                return Err(self.already_exists(&email).await);
            }
            Err(e) => {
                error!(error = %e, "create user failed");
                return Err(e.into());
            }
        };

        info!(user_id = user.id, email = %user.email, "user registered");
        Ok(PublicUser {
            id: user.id,
            email: user.email,
        })
    }

    async fn already_exists(&self, email: &str) -> AuthError {
        match self.users.find_by_email(email).await {
            Ok(Some(winner)) => {
                warn!(email = %email, user_id = winner.id, "email registered concurrently");
                AuthError::UserAlreadyExists {
                    id: winner.id,
                    email: winner.email,
                }
            }
            Ok(None) => AuthError::Internal(anyhow::anyhow!(
                "store reported a duplicate email but no such user exists"
            )),
            Err(e) => e.into(),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        self.login_with_ttl(email, password, self.session_ttl).await
    }

    /// Like [`CredentialService::login`] with an explicit token lifetime.
    pub async fn login_with_ttl(
        &self,
        email: &str,
        password: &str,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let found = self.users.find_by_email(email).await.map_err(|e| {
            error!(error = %e, "find_by_email failed");
            AuthError::from(e)
        })?;

        let matched = self
            .check_password(password, found.as_ref().map(|u| u.password_hash.as_str()))
            .await?;

        let user = match found {
            Some(u) if matched => u,
            Some(u) => {
                warn!(email = %email, user_id = u.id, "login invalid password");
                return Err(AuthError::InvalidCredentials);
            }
            None => {
                warn!(email = %email, "login unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let token = self.tokens.issue(user.id, &user.email, ttl).map_err(|e| {
            error!(error = %e, "jwt sign failed");
            AuthError::Internal(e.into())
        })?;

        info!(user_id = user.id, email = %user.email, "user logged in");
        Ok(token)
    }

    /// Verifies off the async workers. With no stored hash the dummy one is
    /// checked instead and the answer is always `false`.
    async fn check_password(&self, password: &str, stored: Option<&str>) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let plain = password.to_owned();
        let known = stored.is_some();
        let hash = stored.unwrap_or(&self.dummy_hash).to_owned();
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
            .await
            .map_err(|e| AuthError::Internal(e.into()))?;
        Ok(known && matched)
    }
}
