use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

use u2i_auth::{AuthStore, CreateUserRequest, UserFilter};

pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: Option<&'a str>,
}

pub async fn list(base_dir: &Path, search: Option<String>) -> Result<()> {
    let (_, service) = super::open_service(base_dir).await?;
    let users = service
        .users()
        .list(&UserFilter {
            search,
            ..Default::default()
        })
        .await?;

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    let role_names: HashMap<String, String> = service
        .roles()
        .list(None)
        .await?
        .into_iter()
        .map(|r| (r.id, r.name))
        .collect();

    println!(
        "{:<16} {:<28} {:<16} {:<8} {}",
        "USERNAME", "EMAIL", "ROLE", "STATE", "LAST LOGIN"
    );
    println!("{}", "-".repeat(90));

    for u in &users {
        println!(
            "{:<16} {:<28} {:<16} {:<8} {}",
            u.username,
            u.email,
            role_names.get(&u.role_id).map_or("<missing>", String::as_str),
            if u.is_active { "active" } else { "inactive" },
            u.last_login.as_deref().unwrap_or("never"),
        );
    }
    Ok(())
}

pub async fn create(
    base_dir: &Path,
    account: NewAccount<'_>,
    cli_password: &Option<String>,
) -> Result<()> {
    let (_, service) = super::open_service(base_dir).await?;
    let role_id = match account.role {
        Some(name) => Some(service.roles().get_by_name(name).await?.id),
        None => None,
    };
    let password = crate::get_password(cli_password, "New password: ")?;

    let user = service
        .users()
        .create(&CreateUserRequest {
            username: account.username.to_string(),
            email: account.email.to_string(),
            password,
            first_name: account.first_name.to_string(),
            last_name: account.last_name.to_string(),
            role_id,
            phone: None,
        })
        .await?;
    println!("Created user {} ({})", user.username, user.id);
    Ok(())
}

pub async fn passwd(base_dir: &Path, login: &str, cli_password: &Option<String>) -> Result<()> {
    let (_, service) = super::open_service(base_dir).await?;
    let user = service.store().get_user_by_login(login).await?;
    let password = crate::get_password(cli_password, "New password: ")?;
    service.users().reset_password(&user.id, &password).await?;
    tracing::info!(user = %user.username, "password reset from the command line");
    println!("Password updated for {}", user.username);
    Ok(())
}
