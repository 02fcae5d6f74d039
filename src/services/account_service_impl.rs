//! `SeaORM` implementation of the `AccountService` trait.

use async_trait::async_trait;
use tokio::task;

use crate::config::SecurityConfig;
use crate::db::{Store, User};
use crate::services::account_service::{AccountError, AccountService};
use crate::services::password;

pub struct SeaOrmAccountService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    /// Hash a plaintext on the blocking pool with the configured work factor.
    async fn hash(&self, password: &str) -> Result<String, AccountError> {
        let password = password.to_string();
        let security = self.security.clone();

        let hash = task::spawn_blocking(move || password::hash_password(&password, Some(&security)))
            .await
            .map_err(|e| AccountError::Internal(format!("Password hashing task panicked: {e}")))??;

        Ok(hash)
    }

    /// Verify a plaintext against a stored hash on the blocking pool.
    async fn verify(&self, password: &str, password_hash: String) -> Result<bool, AccountError> {
        let password = password.to_string();

        let is_valid =
            task::spawn_blocking(move || password::verify_password(&password, &password_hash))
                .await
                .map_err(|e| {
                    AccountError::Internal(format!("Password verification task panicked: {e}"))
                })?;

        Ok(is_valid)
    }

    async fn set_password(&self, username: &str, password: &str) -> Result<User, AccountError> {
        let hash = self.hash(password).await?;

        self.store
            .users()
            .set_password_hash(username, &hash)
            .await?
            .ok_or(AccountError::NotFound)
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn list_all(&self) -> Result<Vec<User>, AccountError> {
        Ok(self.store.users().list_all().await?)
    }

    async fn register(
        &self,
        username: &str,
        password: &str,
        roles: &[String],
    ) -> Result<User, AccountError> {
        if username.is_empty() {
            return Err(AccountError::Validation("Username is required".to_string()));
        }
        if password.is_empty() {
            return Err(AccountError::Validation("Password is required".to_string()));
        }

        let hash = self.hash(password).await?;

        let user = self
            .store
            .users()
            .insert(username, &hash, roles)
            .await?
            .ok_or(AccountError::Conflict)?;

        tracing::info!("Registered user: {username}");

        Ok(user)
    }

    async fn change_password(&self, username: &str, password: &str) -> Result<User, AccountError> {
        let user = self.set_password(username, password).await?;
        tracing::info!("Password changed for user: {username}");
        Ok(user)
    }

    async fn forget_password(&self, username: &str, password: &str) -> Result<User, AccountError> {
        let user = self.set_password(username, password).await?;
        tracing::info!("Password reset for user: {username}");
        Ok(user)
    }

    async fn admin_reset(&self, username: &str, password: &str) -> Result<User, AccountError> {
        let user = self.set_password(username, password).await?;
        tracing::info!("Admin password reset for user: {username}");
        Ok(user)
    }

    async fn remove(&self, username: &str, password: &str) -> Result<User, AccountError> {
        let (user, password_hash) = self
            .store
            .users()
            .get_by_username_with_password(username)
            .await?
            .ok_or(AccountError::NotFound)?;

        if !self.verify(password, password_hash).await? {
            return Err(AccountError::InvalidCredentials);
        }

        if !self.store.users().delete_by_username(username).await? {
            // Vanished between verify and delete; collapses to not-found.
            return Err(AccountError::NotFound);
        }

        tracing::info!("Deleted user: {username}");

        Ok(user)
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<User, AccountError> {
        let Some((user, password_hash)) = self
            .store
            .users()
            .get_by_username_with_password(username)
            .await?
        else {
            return Err(AccountError::InvalidCredentials);
        };

        if !self.verify(password, password_hash).await? {
            return Err(AccountError::InvalidCredentials);
        }

        Ok(user)
    }
}
