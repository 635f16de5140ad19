use serde::Serialize;

use crate::catalog::{DEFAULT_ROLES, DEFAULT_SETTINGS, PERMISSIONS, TOP_ADMIN_ROLE};
use crate::config::BootstrapSettings;
use crate::error::AuthError;
use crate::password::hash_password;
use crate::store::AuthStore;
use crate::types::{CreateSettingRequest, NewRole, NewUser};

/// What a seeding run actually created. A second run reports all zeros.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub permissions_created: usize,
    pub roles_created: usize,
    pub users_created: usize,
    pub settings_created: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        *self == SeedReport::default()
    }
}

/// Create every default permission, role, admin account and setting that is
/// not already present by natural key. Existing rows are never touched.
///
/// Safe to run from several processes at once: losing an insert race
/// surfaces as `DuplicateName`, which counts as "already present".
pub async fn seed_defaults(
    store: &dyn AuthStore,
    bootstrap: &BootstrapSettings,
) -> Result<SeedReport, AuthError> {
    let mut report = SeedReport::default();

    for p in PERMISSIONS {
        match store.get_permission_by_name(p.name).await {
            Ok(_) => tracing::debug!(permission = p.name, "permission exists"),
            Err(AuthError::NotFound(_)) => {
                match store.create_permission(p.name, p.description, p.category).await {
                    Ok(_) => {
                        report.permissions_created += 1;
                        tracing::info!(permission = p.name, "created permission");
                    }
                    Err(AuthError::DuplicateName(_)) => {}
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }
    }

    let mut admin_role_id = None;
    for seed in DEFAULT_ROLES {
        let role = match store.get_role_by_name(seed.name).await {
            Ok(r) => r,
            Err(AuthError::NotFound(_)) => {
                let permissions = seed.bundle.permission_names();
                let new_role = NewRole {
                    name: seed.name,
                    display_name: seed.display_name,
                    description: seed.description,
                    level: seed.level,
                    is_system: true,
                    permissions: &permissions,
                };
                match store.create_role(&new_role).await {
                    Ok(r) => {
                        report.roles_created += 1;
                        tracing::info!(role = seed.name, level = seed.level, "created role");
                        r
                    }
                    Err(AuthError::DuplicateName(_)) => store.get_role_by_name(seed.name).await?,
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };
        if role.name == TOP_ADMIN_ROLE {
            admin_role_id = Some(role.id);
        }
    }

    let admin_role_id = admin_role_id
        .ok_or_else(|| AuthError::Internal(format!("role '{TOP_ADMIN_ROLE}' missing after seeding")))?;

    match store.get_user_by_login(&bootstrap.admin_username).await {
        Ok(_) => tracing::debug!(user = %bootstrap.admin_username, "admin account exists"),
        Err(AuthError::NotFound(_)) => {
            let password_hash = hash_password(&bootstrap.admin_password)?;
            let email = bootstrap.admin_email.trim().to_lowercase();
            let new_user = NewUser {
                username: &bootstrap.admin_username,
                email: &email,
                password_hash: &password_hash,
                first_name: &bootstrap.admin_first_name,
                last_name: &bootstrap.admin_last_name,
                role_id: &admin_role_id,
                phone: None,
            };
            match store.create_user(&new_user).await {
                Ok(user) => {
                    report.users_created += 1;
                    tracing::info!(user = %user.username, "created admin account");
                    tracing::warn!(
                        user = %user.username,
                        "admin account uses the bootstrap password; change it after first login"
                    );
                }
                // Only a lost race counts as present. An email held by
                // another account is an error.
                Err(AuthError::DuplicateName(msg)) => {
                    match store.get_user_by_login(&bootstrap.admin_username).await {
                        Ok(user) if user.username == bootstrap.admin_username => {}
                        Ok(_) | Err(AuthError::NotFound(_)) => {
                            return Err(AuthError::DuplicateName(msg));
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(e) => return Err(e),
    }

    for s in DEFAULT_SETTINGS {
        match store.get_setting(s.key).await {
            Ok(_) => tracing::debug!(setting = s.key, "setting exists"),
            Err(AuthError::NotFound(_)) => {
                let req = CreateSettingRequest {
                    key: s.key.to_string(),
                    value: s.value.to_json(),
                    category: s.category,
                    description: s.description.to_string(),
                    is_modifiable: true,
                };
                match store.create_setting(&req, None).await {
                    Ok(_) => {
                        report.settings_created += 1;
                        tracing::info!(setting = s.key, "created setting");
                    }
                    Err(AuthError::DuplicateName(_)) => {}
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}
