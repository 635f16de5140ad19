use anyhow::Result;
use std::path::Path;

pub async fn list(base_dir: &Path) -> Result<()> {
    let (_, service) = super::open_service(base_dir).await?;
    let roles = service.roles().list(None).await?;

    if roles.is_empty() {
        println!("No roles found. Run `u2i seed` first.");
        return Ok(());
    }

    println!(
        "{:<16} {:<20} {:>5} {:<8} {:<6} {:>5}",
        "NAME", "DISPLAY NAME", "LEVEL", "STATE", "SYSTEM", "PERMS"
    );
    println!("{}", "-".repeat(66));

    for role in &roles {
        let resolved = service.roles().resolve(&role.id).await?;
        println!(
            "{:<16} {:<20} {:>5} {:<8} {:<6} {:>5}",
            role.name,
            role.display_name,
            role.level,
            if role.is_active { "active" } else { "inactive" },
            if role.is_system { "yes" } else { "no" },
            resolved.effective_permissions().len(),
        );
    }
    Ok(())
}

pub async fn set_permissions(base_dir: &Path, role: &str, permissions: &[String]) -> Result<()> {
    let (_, service) = super::open_service(base_dir).await?;
    let role = service.roles().get_by_name(role).await?;
    let resolved = service
        .roles()
        .update_permissions(&role.id, permissions)
        .await?;

    println!("Updated {}:", resolved.role.name);
    for p in &resolved.permissions {
        println!(
            "  {}{}",
            p.name,
            if p.is_active { "" } else { " (inactive)" }
        );
    }
    Ok(())
}
