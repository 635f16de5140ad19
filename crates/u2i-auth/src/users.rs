use std::sync::Arc;

use crate::catalog::DEFAULT_USER_ROLE;
use crate::error::AuthError;
use crate::password::{check_password_policy, hash_password, verify_password};
use crate::store::AuthStore;
use crate::types::{CreateUserRequest, NewUser, UpdateUserRequest, User, UserFilter};

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AuthError::InvalidInput(format!("invalid email '{email}'"))),
    }
}

fn check_username(username: &str) -> Result<String, AuthError> {
    let username = username.trim();
    if username.chars().count() < 3 {
        return Err(AuthError::InvalidInput(
            "username must be at least 3 characters".into(),
        ));
    }
    Ok(username.to_string())
}

fn require_non_empty(value: &str, field: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}

/// Account administration. Passwords are hashed before they reach the store
/// and never leave it again.
#[derive(Clone)]
pub struct UserManager {
    store: Arc<dyn AuthStore>,
    password_min_length: usize,
}

impl UserManager {
    pub fn new(store: Arc<dyn AuthStore>, password_min_length: usize) -> Self {
        Self {
            store,
            password_min_length,
        }
    }

    /// Create an account bound to `req.role_id`, or to the default user role
    /// when none is given.
    pub async fn create(&self, req: &CreateUserRequest) -> Result<User, AuthError> {
        let username = check_username(&req.username)?;
        let email = normalize_email(&req.email)?;
        check_password_policy(&req.password, self.password_min_length)?;
        require_non_empty(&req.first_name, "first name")?;
        require_non_empty(&req.last_name, "last name")?;

        let role = match req.role_id.as_deref() {
            Some(id) => self.store.get_role(id).await?,
            None => self.store.get_role_by_name(DEFAULT_USER_ROLE).await?,
        };

        let password_hash = hash_password(&req.password)?;
        let user = self
            .store
            .create_user(&NewUser {
                username: &username,
                email: &email,
                password_hash: &password_hash,
                first_name: req.first_name.trim(),
                last_name: req.last_name.trim(),
                role_id: &role.id,
                phone: req.phone.as_deref().map(str::trim),
            })
            .await?;
        tracing::info!(user = %user.username, role = %role.name, "created user");
        Ok(user)
    }

    pub async fn get(&self, id: &str) -> Result<User, AuthError> {
        self.store.get_user_by_id(id).await
    }

    pub async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, AuthError> {
        self.store.list_users(filter).await
    }

    pub async fn count(&self) -> Result<u64, AuthError> {
        self.store.user_count().await
    }

    pub async fn update_profile(
        &self,
        id: &str,
        req: &UpdateUserRequest,
    ) -> Result<User, AuthError> {
        let username = req.username.as_deref().map(check_username).transpose()?;
        let email = req.email.as_deref().map(normalize_email).transpose()?;
        if let Some(ref name) = req.first_name {
            require_non_empty(name, "first name")?;
        }
        if let Some(ref name) = req.last_name {
            require_non_empty(name, "last name")?;
        }
        let req = UpdateUserRequest {
            username,
            email,
            first_name: req.first_name.as_deref().map(|s| s.trim().to_string()),
            last_name: req.last_name.as_deref().map(|s| s.trim().to_string()),
            phone: req.phone.clone(),
            avatar: req.avatar.clone(),
        };
        self.store.update_user(id, &req).await
    }

    pub async fn assign_role(&self, id: &str, role_id: &str) -> Result<User, AuthError> {
        let role = self.store.get_role(role_id).await?;
        let user = self.store.set_user_role(id, &role.id).await?;
        tracing::info!(user = %user.username, role = %role.name, "assigned role");
        Ok(user)
    }

    pub async fn set_active(&self, id: &str, active: bool) -> Result<User, AuthError> {
        let user = self.store.set_user_active(id, active).await?;
        tracing::info!(user = %user.username, active, "user state changed");
        Ok(user)
    }

    pub async fn toggle_active(&self, id: &str) -> Result<User, AuthError> {
        let user = self.store.get_user_by_id(id).await?;
        self.set_active(id, !user.is_active).await
    }

    /// Self-service change: the current password must verify first.
    pub async fn change_password(
        &self,
        id: &str,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        let stored = self.store.get_password_hash(id).await?;
        if !verify_password(current, &stored)? {
            return Err(AuthError::InvalidCredentials);
        }
        self.reset_password(id, new).await
    }

    /// Administrative reset, no knowledge of the old password needed.
    pub async fn reset_password(&self, id: &str, new: &str) -> Result<(), AuthError> {
        check_password_policy(new, self.password_min_length)?;
        let password_hash = hash_password(new)?;
        self.store.update_password(id, &password_hash).await?;
        tracing::info!(user_id = id, "password changed");
        Ok(())
    }

    pub async fn verify_password(&self, id: &str, candidate: &str) -> Result<bool, AuthError> {
        let stored = self.store.get_password_hash(id).await?;
        verify_password(candidate, &stored)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AuthError> {
        self.store.delete_user(id).await?;
        tracing::info!(user_id = id, "deleted user");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Jane@U2I.Local ").unwrap(), "jane@u2i.local");
        assert!(normalize_email("jane").is_err());
        assert!(normalize_email("@u2i.local").is_err());
        assert!(normalize_email("jane@").is_err());
    }

    #[test]
    fn usernames_are_trimmed_and_length_checked() {
        assert_eq!(check_username("  jdoe ").unwrap(), "jdoe");
        assert!(check_username(" jd ").is_err());
    }
}
