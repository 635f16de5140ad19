use anyhow::Result;
use std::path::Path;

pub async fn login(base_dir: &Path, login: &str, cli_password: &Option<String>) -> Result<()> {
    let (_, service) = super::open_service(base_dir).await?;
    let password = crate::get_password(cli_password, "Password: ")?;
    let session = service.login(login, &password).await?;

    println!("Signed in as {}", session.principal.user.username);
    println!(
        "  Role:    {}",
        session.principal.role_name().unwrap_or("<none>")
    );
    println!("  Expires: {}", format_unix(session.credential.expires_at));
    println!();
    println!("{}", session.credential.token);
    Ok(())
}

pub async fn whoami(base_dir: &Path, token: &str) -> Result<()> {
    let (_, service) = super::open_service(base_dir).await?;
    let principal = service.authenticate(token).await?;

    println!("User:     {}", principal.user.username);
    println!("Email:    {}", principal.user.email);
    println!(
        "Name:     {} {}",
        principal.user.first_name, principal.user.last_name
    );
    match principal.role {
        Some(ref resolved) => println!(
            "Role:     {} (level {}{})",
            resolved.role.name,
            resolved.role.level,
            if resolved.role.is_active { "" } else { ", inactive" }
        ),
        None => println!("Role:     <missing>"),
    }
    println!();
    let effective = principal.effective_permissions();
    if effective.is_empty() {
        println!("No effective permissions.");
    } else {
        println!("Effective permissions:");
        for p in &effective {
            println!("  {p}");
        }
    }
    Ok(())
}

/// Prints the decision as JSON; exits non-zero on deny.
pub async fn check(base_dir: &Path, token: &str, permissions: &[String]) -> Result<()> {
    let (_, service) = super::open_service(base_dir).await?;
    let principal = service.authenticate(token).await?;
    let decision = service.authorize(&principal, permissions);

    println!("{}", serde_json::to_string_pretty(&decision)?);
    decision.into_result()?;
    Ok(())
}

fn format_unix(secs: i64) -> String {
    match chrono::DateTime::from_timestamp(secs, 0) {
        Some(t) => t.to_rfc3339(),
        None => secs.to_string(),
    }
}
