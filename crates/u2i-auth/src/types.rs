use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionCategory {
    User,
    Mission,
    Equipment,
    Vehicle,
    Role,
    Permission,
    Settings,
    Admin,
}

impl PermissionCategory {
    pub const ALL: [PermissionCategory; 8] = [
        PermissionCategory::User,
        PermissionCategory::Mission,
        PermissionCategory::Equipment,
        PermissionCategory::Vehicle,
        PermissionCategory::Role,
        PermissionCategory::Permission,
        PermissionCategory::Settings,
        PermissionCategory::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionCategory::User => "user",
            PermissionCategory::Mission => "mission",
            PermissionCategory::Equipment => "equipment",
            PermissionCategory::Vehicle => "vehicle",
            PermissionCategory::Role => "role",
            PermissionCategory::Permission => "permission",
            PermissionCategory::Settings => "settings",
            PermissionCategory::Admin => "admin",
        }
    }
}

impl fmt::Display for PermissionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionCategory {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermissionCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AuthError::InvalidInput(format!("unknown permission category '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingCategory {
    General,
    Security,
    Appearance,
    Notifications,
    System,
}

impl SettingCategory {
    pub const ALL: [SettingCategory; 5] = [
        SettingCategory::General,
        SettingCategory::Security,
        SettingCategory::Appearance,
        SettingCategory::Notifications,
        SettingCategory::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingCategory::General => "general",
            SettingCategory::Security => "security",
            SettingCategory::Appearance => "appearance",
            SettingCategory::Notifications => "notifications",
            SettingCategory::System => "system",
        }
    }
}

impl fmt::Display for SettingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingCategory {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AuthError::InvalidInput(format!("unknown setting category '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: PermissionCategory,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Display and sort only; never consulted when authorizing.
    pub level: u8,
    pub is_active: bool,
    pub is_system: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A role joined with the current state of every permission it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRole {
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl ResolvedRole {
    /// Names of referenced permissions that are individually active.
    pub fn effective_permissions(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .permissions
            .iter()
            .filter(|p| p.is_active)
            .map(|p| p.name.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// External representation of a user account. The password hash is never
/// part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: String,
    pub is_active: bool,
    pub last_login: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// An authenticated user with its role fully resolved.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub user: User,
    /// `None` when the referenced role no longer exists.
    pub role: Option<ResolvedRole>,
}

impl Principal {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn role_name(&self) -> Option<&str> {
        self.role.as_ref().map(|r| r.role.name.as_str())
    }

    pub fn effective_permissions(&self) -> Vec<String> {
        self.role
            .as_ref()
            .map(ResolvedRole::effective_permissions)
            .unwrap_or_default()
    }
}

/// A signed bearer token with its validity window (unix seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub principal: Principal,
    pub credential: Credential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
    pub category: SettingCategory,
    pub description: String,
    pub is_modifiable: bool,
    pub last_modified_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSettingRequest {
    pub key: String,
    pub value: serde_json::Value,
    pub category: SettingCategory,
    #[serde(default)]
    pub description: String,
    /// Locked settings refuse later updates and deletion.
    #[serde(default = "default_true")]
    pub is_modifiable: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettingRequest {
    pub value: Option<serde_json::Value>,
    pub description: Option<String>,
    pub category: Option<SettingCategory>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePermissionRequest {
    pub description: Option<String>,
    pub category: Option<PermissionCategory>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub level: i64,
    /// Permission names; duplicates collapse.
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRoleRequest {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub level: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Falls back to the default user role when absent.
    pub role_id: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    /// Case-insensitive match on username, email, first or last name.
    pub search: Option<String>,
    pub role_id: Option<String>,
    pub is_active: Option<bool>,
}

/// Row shape handed to the store when inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role_id: &'a str,
    pub phone: Option<&'a str>,
}

/// Row shape handed to the store when inserting a role.
#[derive(Debug, Clone)]
pub struct NewRole<'a> {
    pub name: &'a str,
    pub display_name: &'a str,
    pub description: &'a str,
    pub level: u8,
    pub is_system: bool,
    pub permissions: &'a [String],
}
