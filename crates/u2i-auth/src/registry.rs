//! The catalog of atomic capabilities as stored, grouped by category.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::catalog::validate_permission_name;
use crate::error::AuthError;
use crate::store::AuthStore;
use crate::types::{Permission, PermissionCategory, UpdatePermissionRequest};

#[derive(Clone)]
pub struct PermissionRegistry {
    store: Arc<dyn AuthStore>,
}

impl PermissionRegistry {
    pub fn new(store: Arc<dyn AuthStore>) -> Self {
        Self { store }
    }

    pub async fn register(
        &self,
        name: &str,
        description: &str,
        category: PermissionCategory,
    ) -> Result<Permission, AuthError> {
        let name = name.trim();
        validate_permission_name(name)?;
        if description.trim().is_empty() {
            return Err(AuthError::InvalidInput("description is required".into()));
        }
        let permission = self
            .store
            .create_permission(name, description.trim(), category)
            .await?;
        tracing::info!(permission = %permission.name, category = %category, "registered permission");
        Ok(permission)
    }

    pub async fn get(&self, name: &str) -> Result<Permission, AuthError> {
        self.store.get_permission_by_name(name).await
    }

    /// Sorted by category, then name.
    pub async fn list(
        &self,
        category: Option<PermissionCategory>,
        active: Option<bool>,
    ) -> Result<Vec<Permission>, AuthError> {
        let all = self.store.list_permissions().await?;
        Ok(all
            .into_iter()
            .filter(|p| category.is_none_or(|c| p.category == c))
            .filter(|p| active.is_none_or(|a| p.is_active == a))
            .collect())
    }

    pub async fn list_by_category(
        &self,
    ) -> Result<BTreeMap<PermissionCategory, Vec<Permission>>, AuthError> {
        let mut grouped: BTreeMap<PermissionCategory, Vec<Permission>> = BTreeMap::new();
        for p in self.store.list_permissions().await? {
            grouped.entry(p.category).or_default().push(p);
        }
        for perms in grouped.values_mut() {
            perms.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(grouped)
    }

    /// Description and category only; the name is immutable.
    pub async fn update(
        &self,
        name: &str,
        req: &UpdatePermissionRequest,
    ) -> Result<Permission, AuthError> {
        if req.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(AuthError::InvalidInput("description must not be empty".into()));
        }
        self.store.update_permission(name, req).await
    }

    pub async fn activate(&self, name: &str) -> Result<Permission, AuthError> {
        self.set_active(name, true).await
    }

    /// Roles keep their reference but lose the capability until reactivation.
    pub async fn deactivate(&self, name: &str) -> Result<Permission, AuthError> {
        self.set_active(name, false).await
    }

    pub async fn toggle(&self, name: &str) -> Result<Permission, AuthError> {
        let current = self.store.get_permission_by_name(name).await?;
        self.set_active(name, !current.is_active).await
    }

    async fn set_active(&self, name: &str, active: bool) -> Result<Permission, AuthError> {
        let permission = self.store.set_permission_active(name, active).await?;
        tracing::info!(permission = %permission.name, active, "permission state changed");
        Ok(permission)
    }

    /// Hard delete, refused with `PermissionInUse` while any role references it.
    pub async fn delete(&self, name: &str) -> Result<(), AuthError> {
        self.store.delete_permission(name).await?;
        tracing::info!(permission = name, "deleted permission");
        Ok(())
    }
}
