//! Role lifecycle and the protection rules around system roles.
//!
//! Any system role is undeletable. The top administrative role is fully
//! frozen: no field or permission change is accepted.

use std::sync::Arc;

use crate::catalog::TOP_ADMIN_ROLE;
use crate::error::AuthError;
use crate::store::AuthStore;
use crate::types::{CreateRoleRequest, NewRole, ResolvedRole, Role, UpdateRoleRequest};

pub fn is_frozen(role: &Role) -> bool {
    role.is_system && role.name == TOP_ADMIN_ROLE
}

fn check_level(level: i64) -> Result<u8, AuthError> {
    u8::try_from(level)
        .ok()
        .filter(|l| *l <= 100)
        .ok_or(AuthError::InvalidLevel(level))
}

#[derive(Clone)]
pub struct RoleManager {
    store: Arc<dyn AuthStore>,
}

impl RoleManager {
    pub fn new(store: Arc<dyn AuthStore>) -> Self {
        Self { store }
    }

    /// Roles created here are never system roles; only the seeder makes those.
    pub async fn create(&self, req: &CreateRoleRequest) -> Result<ResolvedRole, AuthError> {
        let name = req.name.trim();
        if name.is_empty() || req.display_name.trim().is_empty() {
            return Err(AuthError::InvalidInput("name and display name are required".into()));
        }
        let level = check_level(req.level)?;
        let role = self
            .store
            .create_role(&NewRole {
                name,
                display_name: req.display_name.trim(),
                description: req.description.trim(),
                level,
                is_system: false,
                permissions: &req.permissions,
            })
            .await?;
        tracing::info!(role = %role.name, level, "created role");
        self.store.resolve_role(&role.id).await
    }

    pub async fn get(&self, id: &str) -> Result<Role, AuthError> {
        self.store.get_role(id).await
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Role, AuthError> {
        self.store.get_role_by_name(name).await
    }

    pub async fn resolve(&self, id: &str) -> Result<ResolvedRole, AuthError> {
        self.store.resolve_role(id).await
    }

    /// Highest level first.
    pub async fn list(&self, active: Option<bool>) -> Result<Vec<Role>, AuthError> {
        let roles = self.store.list_roles().await?;
        Ok(roles
            .into_iter()
            .filter(|r| active.is_none_or(|a| r.is_active == a))
            .collect())
    }

    pub async fn update(&self, id: &str, req: &UpdateRoleRequest) -> Result<Role, AuthError> {
        let role = self.store.get_role(id).await?;
        if is_frozen(&role) {
            return Err(AuthError::RoleFrozen(role.name));
        }
        if let Some(level) = req.level {
            check_level(level)?;
        }
        if req.display_name.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(AuthError::InvalidInput("display name must not be empty".into()));
        }
        let updated = self.store.update_role(id, req).await?;
        tracing::info!(role = %updated.name, "updated role");
        Ok(updated)
    }

    pub async fn set_active(&self, id: &str, active: bool) -> Result<Role, AuthError> {
        let req = UpdateRoleRequest {
            is_active: Some(active),
            ..Default::default()
        };
        self.update(id, &req).await
    }

    /// Wholesale replacement: `permissions` is the complete new set of names.
    pub async fn update_permissions(
        &self,
        id: &str,
        permissions: &[String],
    ) -> Result<ResolvedRole, AuthError> {
        let role = self.store.get_role(id).await?;
        if is_frozen(&role) {
            return Err(AuthError::RoleFrozen(role.name));
        }
        self.store.replace_role_permissions(id, permissions).await?;
        tracing::info!(role = %role.name, count = permissions.len(), "replaced role permissions");
        self.store.resolve_role(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), AuthError> {
        let role = self.store.get_role(id).await?;
        if role.is_system {
            return Err(AuthError::RoleProtected(role.name));
        }
        self.store.delete_role(id).await?;
        tracing::info!(role = %role.name, "deleted role");
        Ok(())
    }
}
