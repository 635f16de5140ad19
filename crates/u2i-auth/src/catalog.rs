//! Seeded configuration contract: the override capability, the default
//! permission catalog, the default roles with their bundles and the default
//! settings. Route collaborators gate on these exact strings.

use crate::error::AuthError;
use crate::types::{PermissionCategory, SettingCategory};

/// Holding this capability (active) grants every other capability.
pub const ADMIN_ACCESS: &str = "admin.access";

/// The top administrative role. Fully frozen once seeded.
pub const TOP_ADMIN_ROLE: &str = "administrateur";

/// Role assigned on registration when none is requested.
pub const DEFAULT_USER_ROLE: &str = "utilisateur";

pub struct PermissionSeed {
    pub name: &'static str,
    pub description: &'static str,
    pub category: PermissionCategory,
}

const fn perm(
    name: &'static str,
    description: &'static str,
    category: PermissionCategory,
) -> PermissionSeed {
    PermissionSeed {
        name,
        description,
        category,
    }
}

pub const PERMISSIONS: &[PermissionSeed] = &[
    perm("user.create", "Create users", PermissionCategory::User),
    perm("user.read", "View users", PermissionCategory::User),
    perm("user.update", "Modify users", PermissionCategory::User),
    perm("user.delete", "Delete users", PermissionCategory::User),
    perm("mission.create", "Create missions", PermissionCategory::Mission),
    perm("mission.read", "View missions", PermissionCategory::Mission),
    perm("mission.update", "Modify missions", PermissionCategory::Mission),
    perm("mission.delete", "Delete missions", PermissionCategory::Mission),
    perm("equipment.create", "Create equipment", PermissionCategory::Equipment),
    perm("equipment.read", "View equipment", PermissionCategory::Equipment),
    perm("equipment.update", "Modify equipment", PermissionCategory::Equipment),
    perm("equipment.delete", "Delete equipment", PermissionCategory::Equipment),
    perm("vehicle.create", "Create vehicles", PermissionCategory::Vehicle),
    perm("vehicle.read", "View vehicles", PermissionCategory::Vehicle),
    perm("vehicle.update", "Modify vehicles", PermissionCategory::Vehicle),
    perm("vehicle.delete", "Delete vehicles", PermissionCategory::Vehicle),
    perm("role.create", "Create roles", PermissionCategory::Role),
    perm("role.read", "View roles", PermissionCategory::Role),
    perm("role.update", "Modify roles", PermissionCategory::Role),
    perm("role.delete", "Delete roles", PermissionCategory::Role),
    perm("permission.manage", "Manage permissions", PermissionCategory::Permission),
    perm("settings.manage", "Manage system settings", PermissionCategory::Settings),
    perm(ADMIN_ACCESS, "Full administrative access", PermissionCategory::Admin),
];

pub enum Bundle {
    /// Every catalog permission.
    All,
    /// Every catalog permission whose name does not start with the prefix.
    AllExcept(&'static str),
    Only(&'static [&'static str]),
}

impl Bundle {
    pub fn permission_names(&self) -> Vec<String> {
        match self {
            Bundle::All => PERMISSIONS.iter().map(|p| p.name.to_string()).collect(),
            Bundle::AllExcept(prefix) => PERMISSIONS
                .iter()
                .filter(|p| !p.name.starts_with(prefix))
                .map(|p| p.name.to_string())
                .collect(),
            Bundle::Only(names) => names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

pub struct RoleSeed {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub level: u8,
    pub bundle: Bundle,
}

pub const DEFAULT_ROLES: &[RoleSeed] = &[
    RoleSeed {
        name: TOP_ADMIN_ROLE,
        display_name: "Administrateur",
        description: "Full access to every feature",
        level: 100,
        bundle: Bundle::All,
    },
    RoleSeed {
        name: "direction",
        display_name: "Direction",
        description: "Complete management of operations",
        level: 80,
        bundle: Bundle::AllExcept("admin."),
    },
    RoleSeed {
        name: "commandant",
        display_name: "Commandant",
        description: "Mission and operations management",
        level: 60,
        bundle: Bundle::Only(&[
            "mission.create",
            "mission.read",
            "mission.update",
            "mission.delete",
            "equipment.read",
            "vehicle.read",
            "user.read",
        ]),
    },
    RoleSeed {
        name: "maitre_du_jeu",
        display_name: "Maître du Jeu",
        description: "Scenario creation and management",
        level: 50,
        bundle: Bundle::Only(&[
            "mission.create",
            "mission.read",
            "mission.update",
            "equipment.read",
            "equipment.create",
            "equipment.update",
            "vehicle.read",
            "vehicle.create",
            "vehicle.update",
            "user.read",
        ]),
    },
    RoleSeed {
        name: DEFAULT_USER_ROLE,
        display_name: "Utilisateur",
        description: "Access to assigned missions",
        level: 10,
        bundle: Bundle::Only(&["mission.read", "equipment.read", "vehicle.read"]),
    },
];

pub struct SettingSeed {
    pub key: &'static str,
    pub value: SeedValue,
    pub category: SettingCategory,
    pub description: &'static str,
}

pub enum SeedValue {
    Text(&'static str),
    Integer(i64),
    Float(f64),
}

impl SeedValue {
    pub fn to_json(&self) -> serde_json::Value {
        match *self {
            SeedValue::Text(s) => serde_json::Value::from(s),
            SeedValue::Integer(n) => serde_json::Value::from(n),
            SeedValue::Float(f) => serde_json::Value::from(f),
        }
    }
}

pub const DEFAULT_SETTINGS: &[SettingSeed] = &[
    SettingSeed {
        key: "site.name",
        value: SeedValue::Text("U2I - Unité des Incidents Inhabituels"),
        category: SettingCategory::General,
        description: "Site name",
    },
    SettingSeed {
        key: "site.description",
        value: SeedValue::Text("Mission management system"),
        category: SettingCategory::General,
        description: "Site description",
    },
    SettingSeed {
        key: "security.session_timeout",
        value: SeedValue::Integer(24),
        category: SettingCategory::Security,
        description: "Session duration in hours",
    },
    SettingSeed {
        key: "security.password_min_length",
        value: SeedValue::Integer(6),
        category: SettingCategory::Security,
        description: "Minimum password length",
    },
    SettingSeed {
        key: "map.default_center_lat",
        value: SeedValue::Float(39.8283),
        category: SettingCategory::General,
        description: "Map center latitude",
    },
    SettingSeed {
        key: "map.default_center_lng",
        value: SeedValue::Float(-98.5795),
        category: SettingCategory::General,
        description: "Map center longitude",
    },
    SettingSeed {
        key: "map.default_zoom",
        value: SeedValue::Integer(4),
        category: SettingCategory::General,
        description: "Default map zoom",
    },
];

pub fn role_seed(name: &str) -> Option<&'static RoleSeed> {
    DEFAULT_ROLES.iter().find(|r| r.name == name)
}

/// Permission names are `resource.action`: one dot, lowercase ASCII
/// letters, digits and underscores on both sides.
pub fn validate_permission_name(name: &str) -> Result<(), AuthError> {
    let valid_part = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    };
    match name.split_once('.') {
        Some((resource, action)) if valid_part(resource) && valid_part(action) => Ok(()),
        _ => Err(AuthError::InvalidInput(format!(
            "permission name '{name}' must be of the form resource.action"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalog_names_are_unique_and_well_formed() {
        let mut seen = HashSet::new();
        for p in PERMISSIONS {
            validate_permission_name(p.name).unwrap();
            assert!(seen.insert(p.name), "duplicate permission {}", p.name);
        }
        assert_eq!(PERMISSIONS.len(), 23);
    }

    #[test]
    fn bundles_only_reference_catalog_permissions() {
        let known: HashSet<&str> = PERMISSIONS.iter().map(|p| p.name).collect();
        for role in DEFAULT_ROLES {
            for name in role.bundle.permission_names() {
                assert!(known.contains(name.as_str()), "{} grants unknown {name}", role.name);
            }
        }
    }

    #[test]
    fn direction_gets_everything_but_admin() {
        let names = role_seed("direction").unwrap().bundle.permission_names();
        assert_eq!(names.len(), PERMISSIONS.len() - 1);
        assert!(!names.iter().any(|n| n == ADMIN_ACCESS));
    }

    #[test]
    fn only_top_admin_holds_override() {
        for role in DEFAULT_ROLES {
            let holds = role
                .bundle
                .permission_names()
                .iter()
                .any(|n| n == ADMIN_ACCESS);
            assert_eq!(holds, role.name == TOP_ADMIN_ROLE);
        }
    }

    #[test]
    fn default_role_levels() {
        let levels: Vec<(&str, u8)> = DEFAULT_ROLES.iter().map(|r| (r.name, r.level)).collect();
        assert_eq!(
            levels,
            vec![
                ("administrateur", 100),
                ("direction", 80),
                ("commandant", 60),
                ("maitre_du_jeu", 50),
                ("utilisateur", 10),
            ]
        );
    }

    #[test]
    fn rejects_malformed_names() {
        for bad in ["", "mission", "mission.", ".create", "Mission.create", "a.b.c", "user delete"] {
            assert!(validate_permission_name(bad).is_err(), "{bad} accepted");
        }
        assert!(validate_permission_name("map_layer.read").is_ok());
    }
}
