//! Authorization decisions over a fully resolved role.
//!
//! Everything here is a pure function of the role and the current state of
//! its permissions: no I/O, no caching, same inputs give the same decision.

use serde::Serialize;

use crate::catalog::ADMIN_ACCESS;
use crate::error::AuthError;
use crate::types::{Principal, ResolvedRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The role is missing or inactive.
    RoleInvalid,
    MissingPermissions,
}

/// Diagnostic context attached to a denial. Meant for legitimate clients;
/// callers decide what to expose to untrusted parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Denial {
    pub reason: DenyReason,
    pub required: Vec<String>,
    pub effective: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Decision::Allow => None,
            Decision::Deny(d) => Some(d),
        }
    }

    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(Denial {
                reason: DenyReason::RoleInvalid,
                ..
            }) => Err(AuthError::RoleInvalid),
            Decision::Deny(Denial {
                required,
                effective,
                ..
            }) => Err(AuthError::Forbidden {
                required,
                effective,
            }),
        }
    }
}

/// Decide whether `role` holds every capability in `required`.
///
/// An active [`ADMIN_ACCESS`] permission on the role allows anything.
pub fn evaluate<S: AsRef<str>>(role: Option<&ResolvedRole>, required: &[S]) -> Decision {
    let required: Vec<String> = required.iter().map(|r| r.as_ref().to_string()).collect();

    let role = match role {
        Some(r) if r.role.is_active => r,
        _ => {
            return Decision::Deny(Denial {
                reason: DenyReason::RoleInvalid,
                required,
                effective: Vec::new(),
            });
        }
    };

    let effective = role.effective_permissions();
    if effective.iter().any(|p| p == ADMIN_ACCESS) {
        return Decision::Allow;
    }

    if required.iter().all(|r| effective.contains(r)) {
        Decision::Allow
    } else {
        Decision::Deny(Denial {
            reason: DenyReason::MissingPermissions,
            required,
            effective,
        })
    }
}

pub fn authorize<S: AsRef<str>>(principal: &Principal, required: &[S]) -> Decision {
    let decision = evaluate(principal.role.as_ref(), required);
    tracing::debug!(
        user = %principal.user.username,
        role = principal.role_name().unwrap_or("<none>"),
        allowed = decision.is_allowed(),
        "authorization decision"
    );
    decision
}

/// True when the principal's role is active and holds the override capability.
pub fn is_admin(principal: &Principal) -> bool {
    evaluate(principal.role.as_ref(), &[ADMIN_ACCESS]).is_allowed()
}

/// Role-name gate: allow iff the principal's role is one of `allowed`.
pub fn require_role(principal: &Principal, allowed: &[&str]) -> Result<(), AuthError> {
    match principal.role_name() {
        Some(name) if allowed.contains(&name) => Ok(()),
        _ => Err(AuthError::Forbidden {
            required: allowed.iter().map(|s| s.to_string()).collect(),
            effective: principal.role_name().map(str::to_string).into_iter().collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Permission, PermissionCategory, Role, User};

    fn permission(name: &str, active: bool) -> Permission {
        Permission {
            id: format!("p-{name}"),
            name: name.into(),
            description: String::new(),
            category: PermissionCategory::Mission,
            is_active: active,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn role(name: &str, active: bool, perms: Vec<Permission>) -> ResolvedRole {
        ResolvedRole {
            role: Role {
                id: format!("r-{name}"),
                name: name.into(),
                display_name: name.into(),
                description: String::new(),
                level: 60,
                is_active: active,
                is_system: true,
                created_at: String::new(),
                updated_at: String::new(),
            },
            permissions: perms,
        }
    }

    fn principal(role: Option<ResolvedRole>) -> Principal {
        Principal {
            user: User {
                id: "u-1".into(),
                username: "jdoe".into(),
                email: "jdoe@u2i.local".into(),
                first_name: "J".into(),
                last_name: "Doe".into(),
                role_id: role.as_ref().map(|r| r.role.id.clone()).unwrap_or_default(),
                is_active: true,
                last_login: None,
                phone: None,
                avatar: None,
                created_at: String::new(),
                updated_at: String::new(),
            },
            role,
        }
    }

    fn commandant() -> ResolvedRole {
        let names = [
            "mission.create",
            "mission.read",
            "mission.update",
            "mission.delete",
            "equipment.read",
            "vehicle.read",
            "user.read",
        ];
        role(
            "commandant",
            true,
            names.iter().map(|n| permission(n, true)).collect(),
        )
    }

    #[test]
    fn commandant_may_delete_missions_but_not_users() {
        let u = principal(Some(commandant()));

        assert_eq!(authorize(&u, &["mission.delete"]), Decision::Allow);

        let decision = authorize(&u, &["user.delete"]);
        let denial = decision.denial().unwrap();
        assert_eq!(denial.reason, DenyReason::MissingPermissions);
        assert_eq!(denial.required, vec!["user.delete".to_string()]);
        assert_eq!(denial.effective.len(), 7);
        assert!(denial.effective.contains(&"mission.delete".to_string()));
    }

    #[test]
    fn required_set_is_conjunctive() {
        let u = principal(Some(commandant()));
        assert!(authorize(&u, &["mission.read", "vehicle.read"]).is_allowed());
        assert!(!authorize(&u, &["mission.read", "vehicle.delete"]).is_allowed());
    }

    #[test]
    fn inactive_permission_is_absent() {
        let r = role(
            "ops",
            true,
            vec![permission("mission.read", true), permission("mission.delete", false)],
        );
        assert_eq!(r.effective_permissions(), vec!["mission.read".to_string()]);
        assert!(!evaluate(Some(&r), &["mission.delete"]).is_allowed());
    }

    #[test]
    fn active_override_allows_anything() {
        let r = role("boss", true, vec![permission(ADMIN_ACCESS, true)]);
        assert!(evaluate(Some(&r), &["user.delete", "anything.at_all"]).is_allowed());
        assert!(is_admin(&principal(Some(r))));
    }

    #[test]
    fn inactive_override_grants_nothing() {
        let r = role(
            "boss",
            true,
            vec![permission(ADMIN_ACCESS, false), permission("user.read", true)],
        );
        assert!(!evaluate(Some(&r), &["user.delete"]).is_allowed());
        assert!(evaluate(Some(&r), &["user.read"]).is_allowed());
        assert!(!is_admin(&principal(Some(r))));
    }

    #[test]
    fn inactive_role_is_denied_even_with_override() {
        let r = role("boss", false, vec![permission(ADMIN_ACCESS, true)]);
        let decision = evaluate(Some(&r), &["mission.read"]);
        assert_eq!(decision.denial().unwrap().reason, DenyReason::RoleInvalid);
        assert!(matches!(decision.into_result(), Err(AuthError::RoleInvalid)));
    }

    #[test]
    fn missing_role_is_denied() {
        let u = principal(None);
        let decision = authorize(&u, &["mission.read"]);
        assert_eq!(decision.denial().unwrap().reason, DenyReason::RoleInvalid);
    }

    #[test]
    fn repeated_evaluation_is_stable() {
        let u = principal(Some(commandant()));
        let first = authorize(&u, &["user.delete"]);
        let second = authorize(&u, &["user.delete"]);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_requirement_allows_active_role() {
        let u = principal(Some(role("empty", true, vec![])));
        assert!(authorize::<&str>(&u, &[]).is_allowed());
    }

    #[test]
    fn denial_maps_to_forbidden() {
        let u = principal(Some(commandant()));
        match authorize(&u, &["user.delete"]).into_result() {
            Err(AuthError::Forbidden { required, effective }) => {
                assert_eq!(required, vec!["user.delete".to_string()]);
                assert_eq!(effective.len(), 7);
            }
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn require_role_checks_role_name() {
        let u = principal(Some(commandant()));
        assert!(require_role(&u, &["commandant", "direction"]).is_ok());
        assert!(require_role(&u, &["direction"]).is_err());
        assert!(require_role(&principal(None), &["commandant"]).is_err());
    }
}
