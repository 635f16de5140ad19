use std::sync::Arc;

use u2i_auth::{
    AuthError, AuthStore, BootstrapSettings, CreateRoleRequest, CreateUserRequest, DenyReason,
    PermissionCategory, PermissionRegistry, RoleManager, SqliteAuthStore, TOP_ADMIN_ROLE,
    UpdateRoleRequest, UserManager, evaluate, seed_defaults,
};

async fn seeded_store() -> Arc<SqliteAuthStore> {
    let store = SqliteAuthStore::open_in_memory().unwrap();
    store.migrate().await.unwrap();
    seed_defaults(&store, &BootstrapSettings::default())
        .await
        .unwrap();
    Arc::new(store)
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn role_request(name: &str, level: i64, permissions: &[&str]) -> CreateRoleRequest {
    CreateRoleRequest {
        name: name.into(),
        display_name: name.to_uppercase(),
        description: format!("{name} role"),
        level,
        permissions: names(permissions),
    }
}

#[tokio::test]
async fn commandant_bundle_gates_user_delete() {
    let store = seeded_store().await;
    let role = store.get_role_by_name("commandant").await.unwrap();
    let resolved = store.resolve_role(&role.id).await.unwrap();

    assert_eq!(resolved.effective_permissions().len(), 7);
    assert!(evaluate(Some(&resolved), &["mission.delete"]).is_allowed());

    let decision = evaluate(Some(&resolved), &["user.delete"]);
    let denial = decision.denial().unwrap();
    assert_eq!(denial.reason, DenyReason::MissingPermissions);
    assert_eq!(denial.required, ["user.delete"]);
    assert_eq!(denial.effective.len(), 7);
}

#[tokio::test]
async fn deactivated_permission_drops_out_without_touching_roles() {
    let store = seeded_store().await;
    let registry = PermissionRegistry::new(store.clone());
    let role = store.get_role_by_name("commandant").await.unwrap();

    registry.deactivate("mission.delete").await.unwrap();
    let resolved = store.resolve_role(&role.id).await.unwrap();
    assert_eq!(resolved.permissions.len(), 7);
    assert!(!evaluate(Some(&resolved), &["mission.delete"]).is_allowed());

    registry.toggle("mission.delete").await.unwrap();
    let resolved = store.resolve_role(&role.id).await.unwrap();
    assert!(evaluate(Some(&resolved), &["mission.delete"]).is_allowed());
}

#[tokio::test]
async fn admin_override_allows_unknown_capabilities() {
    let store = seeded_store().await;
    let role = store.get_role_by_name(TOP_ADMIN_ROLE).await.unwrap();
    let resolved = store.resolve_role(&role.id).await.unwrap();
    assert!(evaluate(Some(&resolved), &["anything.at_all", "user.delete"]).is_allowed());
}

#[tokio::test]
async fn deactivated_override_is_ignored() {
    let store = seeded_store().await;
    let roles = RoleManager::new(store.clone());
    let custom = roles
        .create(&role_request("auditor", 30, &["admin.access"]))
        .await
        .unwrap();
    assert!(evaluate(Some(&custom), &["user.delete"]).is_allowed());

    PermissionRegistry::new(store.clone())
        .deactivate("admin.access")
        .await
        .unwrap();
    let custom = roles.resolve(&custom.role.id).await.unwrap();
    assert!(!evaluate(Some(&custom), &["user.delete"]).is_allowed());
}

#[tokio::test]
async fn inactive_role_is_denied() {
    let store = seeded_store().await;
    let roles = RoleManager::new(store.clone());
    let role = roles.get_by_name("direction").await.unwrap();

    roles.set_active(&role.id, false).await.unwrap();
    let resolved = roles.resolve(&role.id).await.unwrap();
    let decision = evaluate(Some(&resolved), &["mission.read"]);
    assert_eq!(decision.denial().unwrap().reason, DenyReason::RoleInvalid);
    assert!(matches!(decision.into_result(), Err(AuthError::RoleInvalid)));
}

#[tokio::test]
async fn top_admin_role_is_frozen() {
    let store = seeded_store().await;
    let roles = RoleManager::new(store.clone());
    let admin = roles.get_by_name(TOP_ADMIN_ROLE).await.unwrap();

    let err = roles
        .update_permissions(&admin.id, &names(&["user.read"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::RoleFrozen(_)));

    let err = roles
        .update(
            &admin.id,
            &UpdateRoleRequest {
                display_name: Some("Root".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::RoleFrozen(_)));

    let err = roles.set_active(&admin.id, false).await.unwrap_err();
    assert!(matches!(err, AuthError::RoleFrozen(_)));

    let unchanged = roles.resolve(&admin.id).await.unwrap();
    assert_eq!(unchanged.permissions.len(), 23);
    assert!(unchanged.role.is_active);
}

#[tokio::test]
async fn other_system_roles_are_editable_but_undeletable() {
    let store = seeded_store().await;
    let roles = RoleManager::new(store.clone());
    let direction = roles.get_by_name("direction").await.unwrap();

    let updated = roles
        .update_permissions(&direction.id, &names(&["mission.read", "mission.read"]))
        .await
        .unwrap();
    assert_eq!(updated.effective_permissions(), ["mission.read"]);

    for role in roles.list(None).await.unwrap() {
        let err = roles.delete(&role.id).await.unwrap_err();
        assert!(matches!(err, AuthError::RoleProtected(_)), "{}", role.name);
    }
}

#[tokio::test]
async fn permission_replacement_is_all_or_nothing() {
    let store = seeded_store().await;
    let roles = RoleManager::new(store.clone());
    let role = roles.get_by_name("maitre_du_jeu").await.unwrap();
    let before = roles.resolve(&role.id).await.unwrap().effective_permissions();

    let err = roles
        .update_permissions(&role.id, &names(&["mission.read", "nuke.launch"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidPermissionRef(ref n) if n == "nuke.launch"));

    let after = roles.resolve(&role.id).await.unwrap().effective_permissions();
    assert_eq!(before, after);
}

#[tokio::test]
async fn create_role_validates_input() {
    let store = seeded_store().await;
    let roles = RoleManager::new(store.clone());

    let err = roles
        .create(&role_request("too_high", 101, &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidLevel(101)));

    let err = roles
        .create(&role_request("ghost", 20, &["ghost.read"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidPermissionRef(_)));
    assert!(matches!(
        roles.get_by_name("ghost").await,
        Err(AuthError::NotFound(_))
    ));

    let err = roles
        .create(&role_request("commandant", 20, &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::DuplicateName(_)));

    let created = roles
        .create(&role_request("observer", 0, &["mission.read"]))
        .await
        .unwrap();
    assert!(!created.role.is_system);
    assert_eq!(created.role.level, 0);
}

#[tokio::test]
async fn assigned_roles_cannot_be_deleted() {
    let store = seeded_store().await;
    let roles = RoleManager::new(store.clone());
    let users = UserManager::new(store.clone(), 6);

    let custom = roles
        .create(&role_request("pilot", 40, &["vehicle.read"]))
        .await
        .unwrap();
    let user = users
        .create(&CreateUserRequest {
            username: "maverick".into(),
            email: "maverick@u2i.local".into(),
            password: "Danger1!".into(),
            first_name: "Pete".into(),
            last_name: "Mitchell".into(),
            role_id: Some(custom.role.id.clone()),
            phone: None,
        })
        .await
        .unwrap();

    let err = roles.delete(&custom.role.id).await.unwrap_err();
    assert!(matches!(err, AuthError::RoleInUse(_)));

    users.delete(&user.id).await.unwrap();
    roles.delete(&custom.role.id).await.unwrap();
    assert!(matches!(
        roles.get(&custom.role.id).await,
        Err(AuthError::NotFound(_))
    ));
}

#[tokio::test]
async fn permission_registry_rules() {
    let store = seeded_store().await;
    let registry = PermissionRegistry::new(store.clone());

    let err = registry
        .register("user.read", "again", PermissionCategory::User)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::DuplicateName(_)));

    let err = registry
        .register("NoDot", "bad", PermissionCategory::User)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidInput(_)));

    let err = registry.delete("mission.read").await.unwrap_err();
    assert!(matches!(err, AuthError::PermissionInUse(_)));

    registry
        .register("report.export", "Export reports", PermissionCategory::Mission)
        .await
        .unwrap();
    registry.delete("report.export").await.unwrap();
    assert!(matches!(
        registry.get("report.export").await,
        Err(AuthError::NotFound(_))
    ));

    let grouped = registry.list_by_category().await.unwrap();
    assert_eq!(grouped[&PermissionCategory::User].len(), 4);
    assert_eq!(grouped[&PermissionCategory::Admin].len(), 1);

    let inactive = registry.list(None, Some(false)).await.unwrap();
    assert!(inactive.is_empty());
}
