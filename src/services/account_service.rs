//! Domain service for the user-account lifecycle.
//!
//! Orchestrates the user store and the password hasher for registration,
//! authentication, password changes and account deletion. Authorization
//! (which caller may invoke which operation) is enforced at the endpoint
//! layer before these methods run.

use thiserror::Error;

use crate::db::User;

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Invalid Credentials")]
    InvalidCredentials,

    #[error("User not found")]
    NotFound,

    #[error("Username already taken")]
    Conflict,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Repository failures arrive wrapped in anyhow (database errors included),
// so this is the single conversion for infrastructure errors.
impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for account management.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Returns all accounts. Caller is expected to already be authorized.
    async fn list_all(&self) -> Result<Vec<User>, AccountError>;

    /// Hashes the plaintext password and persists a new account.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Conflict`] if the username is already taken.
    async fn register(
        &self,
        username: &str,
        password: &str,
        roles: &[String],
    ) -> Result<User, AccountError>;

    /// Re-hashes and persists a new password for an existing account.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::NotFound`] if the username is unknown.
    async fn change_password(&self, username: &str, password: &str) -> Result<User, AccountError>;

    /// Same mutation as [`Self::change_password`], reachable without
    /// authentication (open password-reset path, kept as-is from the
    /// original design).
    async fn forget_password(&self, username: &str, password: &str) -> Result<User, AccountError>;

    /// Same mutation as [`Self::change_password`], restricted to ADMIN
    /// callers by the policy layer.
    async fn admin_reset(&self, username: &str, password: &str) -> Result<User, AccountError>;

    /// Verifies the plaintext against the stored hash, then deletes the
    /// account and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidCredentials`] on mismatch; no deletion
    /// is performed in that case.
    async fn remove(&self, username: &str, password: &str) -> Result<User, AccountError>;

    /// Resolves basic-auth credentials into an account.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidCredentials`] for an unknown username
    /// or a wrong password.
    async fn authenticate(&self, username: &str, password: &str) -> Result<User, AccountError>;
}
