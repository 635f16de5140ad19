pub mod seed;
pub mod sqlite;

pub use sqlite::SqliteAuthStore;

use async_trait::async_trait;

use crate::error::AuthError;
use crate::types::*;

/// Persistence boundary for permissions, roles, users and settings.
///
/// Implementations enforce per-natural-key uniqueness (permission name, role
/// name, username, email, setting key) and apply role permission replacement
/// as one atomic write. Invariants about which roles may change live in the
/// services, not here.
#[async_trait]
pub trait AuthStore: Send + Sync {
    // Permissions
    async fn create_permission(
        &self,
        name: &str,
        description: &str,
        category: PermissionCategory,
    ) -> Result<Permission, AuthError>;
    async fn get_permission_by_name(&self, name: &str) -> Result<Permission, AuthError>;
    async fn list_permissions(&self) -> Result<Vec<Permission>, AuthError>;
    async fn update_permission(
        &self,
        name: &str,
        req: &UpdatePermissionRequest,
    ) -> Result<Permission, AuthError>;
    async fn set_permission_active(
        &self,
        name: &str,
        active: bool,
    ) -> Result<Permission, AuthError>;
    async fn delete_permission(&self, name: &str) -> Result<(), AuthError>;

    // Roles
    async fn create_role(&self, role: &NewRole<'_>) -> Result<Role, AuthError>;
    async fn get_role(&self, id: &str) -> Result<Role, AuthError>;
    async fn get_role_by_name(&self, name: &str) -> Result<Role, AuthError>;
    async fn list_roles(&self) -> Result<Vec<Role>, AuthError>;
    /// Writes already-validated fields; `level` must be within 0..=100.
    async fn update_role(&self, id: &str, req: &UpdateRoleRequest) -> Result<Role, AuthError>;
    /// Replace the whole permission set of a role in one transaction.
    async fn replace_role_permissions(
        &self,
        role_id: &str,
        permission_names: &[String],
    ) -> Result<(), AuthError>;
    async fn list_role_permissions(&self, role_id: &str) -> Result<Vec<Permission>, AuthError>;
    async fn delete_role(&self, id: &str) -> Result<(), AuthError>;

    // Users
    async fn create_user(&self, user: &NewUser<'_>) -> Result<User, AuthError>;
    async fn get_user_by_id(&self, id: &str) -> Result<User, AuthError>;
    /// Look a user up by username or email.
    async fn get_user_by_login(&self, login: &str) -> Result<User, AuthError>;
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, AuthError>;
    async fn update_user(&self, id: &str, req: &UpdateUserRequest) -> Result<User, AuthError>;
    async fn set_user_role(&self, id: &str, role_id: &str) -> Result<User, AuthError>;
    async fn set_user_active(&self, id: &str, active: bool) -> Result<User, AuthError>;
    async fn update_password(&self, id: &str, password_hash: &str) -> Result<(), AuthError>;
    async fn get_password_hash(&self, user_id: &str) -> Result<String, AuthError>;
    async fn touch_last_login(&self, user_id: &str) -> Result<(), AuthError>;
    async fn delete_user(&self, id: &str) -> Result<(), AuthError>;
    async fn user_count(&self) -> Result<u64, AuthError>;

    // Settings
    async fn create_setting(
        &self,
        req: &CreateSettingRequest,
        modified_by: Option<&str>,
    ) -> Result<Setting, AuthError>;
    async fn get_setting(&self, key: &str) -> Result<Setting, AuthError>;
    async fn list_settings(&self) -> Result<Vec<Setting>, AuthError>;
    /// Writes the given fields and stamps `modified_by`; absent fields stay.
    async fn update_setting(
        &self,
        key: &str,
        req: &UpdateSettingRequest,
        modified_by: Option<&str>,
    ) -> Result<Setting, AuthError>;
    async fn delete_setting(&self, key: &str) -> Result<(), AuthError>;

    // Lifecycle
    async fn migrate(&self) -> Result<(), AuthError>;

    /// Role joined with the current state of its permissions.
    async fn resolve_role(&self, role_id: &str) -> Result<ResolvedRole, AuthError> {
        let role = self.get_role(role_id).await?;
        let permissions = self.list_role_permissions(role_id).await?;
        Ok(ResolvedRole { role, permissions })
    }
}
