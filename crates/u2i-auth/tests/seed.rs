use std::sync::Arc;

use u2i_auth::{
    ADMIN_ACCESS, AuthStore, BootstrapSettings, PermissionRegistry, SqliteAuthStore,
    TOP_ADMIN_ROLE, UserFilter, seed_defaults,
};

async fn fresh_store() -> Arc<SqliteAuthStore> {
    let store = SqliteAuthStore::open_in_memory().unwrap();
    store.migrate().await.unwrap();
    Arc::new(store)
}

#[tokio::test]
async fn first_run_creates_the_full_catalog() {
    let store = fresh_store().await;
    let report = seed_defaults(store.as_ref(), &BootstrapSettings::default())
        .await
        .unwrap();

    assert_eq!(report.permissions_created, 23);
    assert_eq!(report.roles_created, 5);
    assert_eq!(report.users_created, 1);
    assert_eq!(report.settings_created, 7);

    let roles = store.list_roles().await.unwrap();
    let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        ["administrateur", "direction", "commandant", "maitre_du_jeu", "utilisateur"]
    );
    assert!(roles.iter().all(|r| r.is_system && r.is_active));
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    let store = fresh_store().await;
    let bootstrap = BootstrapSettings::default();
    seed_defaults(store.as_ref(), &bootstrap).await.unwrap();

    let again = seed_defaults(store.as_ref(), &bootstrap).await.unwrap();
    assert!(again.is_empty(), "{again:?}");

    assert_eq!(store.list_permissions().await.unwrap().len(), 23);
    assert_eq!(store.list_roles().await.unwrap().len(), 5);
    assert_eq!(store.user_count().await.unwrap(), 1);
    assert_eq!(store.list_settings().await.unwrap().len(), 7);
}

#[tokio::test]
async fn reseeding_leaves_admin_edits_alone() {
    let store = fresh_store().await;
    let bootstrap = BootstrapSettings::default();
    seed_defaults(store.as_ref(), &bootstrap).await.unwrap();

    let registry = PermissionRegistry::new(store.clone());
    registry.deactivate("vehicle.delete").await.unwrap();

    seed_defaults(store.as_ref(), &bootstrap).await.unwrap();
    assert!(!registry.get("vehicle.delete").await.unwrap().is_active);
}

#[tokio::test]
async fn bundles_match_the_catalog() {
    let store = fresh_store().await;
    seed_defaults(store.as_ref(), &BootstrapSettings::default())
        .await
        .unwrap();

    let admin = store.get_role_by_name(TOP_ADMIN_ROLE).await.unwrap();
    let admin = store.resolve_role(&admin.id).await.unwrap();
    assert_eq!(admin.permissions.len(), 23);

    let direction = store.get_role_by_name("direction").await.unwrap();
    let direction = store.resolve_role(&direction.id).await.unwrap();
    let effective = direction.effective_permissions();
    assert_eq!(effective.len(), 22);
    assert!(!effective.iter().any(|p| p == ADMIN_ACCESS));

    let user = store.get_role_by_name("utilisateur").await.unwrap();
    let user = store.resolve_role(&user.id).await.unwrap();
    assert_eq!(
        user.effective_permissions(),
        ["equipment.read", "mission.read", "vehicle.read"]
    );
}

#[tokio::test]
async fn admin_account_is_bound_to_the_top_role() {
    let store = fresh_store().await;
    let bootstrap = BootstrapSettings::default();
    seed_defaults(store.as_ref(), &bootstrap).await.unwrap();

    let admin = store.get_user_by_login("admin@u2i.local").await.unwrap();
    assert_eq!(admin.username, "admin");
    assert!(admin.is_active);
    let role = store.get_role(&admin.role_id).await.unwrap();
    assert_eq!(role.name, TOP_ADMIN_ROLE);

    let hash = store.get_password_hash(&admin.id).await.unwrap();
    assert!(u2i_auth::verify_password(&bootstrap.admin_password, &hash).unwrap());

    let everyone = store.list_users(&UserFilter::default()).await.unwrap();
    assert_eq!(everyone.len(), 1);
}

#[tokio::test]
async fn admin_email_held_by_another_account_fails_seeding() {
    let store = fresh_store().await;
    let renamed = BootstrapSettings {
        admin_username: "root".into(),
        ..BootstrapSettings::default()
    };
    seed_defaults(store.as_ref(), &renamed).await.unwrap();

    let err = seed_defaults(store.as_ref(), &BootstrapSettings::default())
        .await
        .unwrap_err();
    assert!(matches!(err, u2i_auth::AuthError::DuplicateName(_)));
    assert!(store.get_user_by_login("admin").await.is_err());
    assert_eq!(store.user_count().await.unwrap(), 1);
}
