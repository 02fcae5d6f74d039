use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
    SqlErr,
};

use crate::entities::users;

/// Account data returned from the repository (without the password hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub roles: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            roles: split_roles(&model.roles),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Parse the comma-separated roles column into role names.
#[must_use]
pub fn split_roles(roles: &str) -> Vec<String> {
    roles
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get account by username along with its stored password hash
    pub async fn get_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    /// All accounts, unordered
    pub async fn list_all(&self) -> Result<Vec<User>> {
        let rows = users::Entity::find()
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Insert a new account with an already-hashed password.
    /// Returns `Ok(None)` when the username is already taken.
    pub async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        roles: &[String],
    ) -> Result<Option<User>> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            roles: Set(roles.join(",")),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(User::from(model))),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(None),
            Err(e) => Err(e).context("Failed to insert user"),
        }
    }

    /// Replace the stored password hash for a user.
    /// Returns `Ok(None)` when the username is unknown.
    pub async fn set_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash.to_string());
        active.updated_at = Set(now);
        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update password hash")?;

        Ok(Some(User::from(updated)))
    }

    /// Delete an account. Returns `false` when it no longer exists.
    pub async fn delete_by_username(&self, username: &str) -> Result<bool> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for deletion")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let result = user
            .delete(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::split_roles;

    #[test]
    fn test_split_roles() {
        assert_eq!(split_roles("ADMIN"), vec!["ADMIN"]);
        assert_eq!(split_roles("ADMIN, USER"), vec!["ADMIN", "USER"]);
        assert_eq!(split_roles(""), Vec::<String>::new());
        assert_eq!(split_roles(",USER,"), vec!["USER"]);
    }
}
