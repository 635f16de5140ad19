use anyhow::Result;
use std::path::Path;

pub async fn list(base_dir: &Path) -> Result<()> {
    let (_, service) = super::open_service(base_dir).await?;
    let grouped = service.permissions().list_by_category().await?;

    if grouped.is_empty() {
        println!("No permissions found. Run `u2i seed` first.");
        return Ok(());
    }

    for (category, permissions) in &grouped {
        println!("[{category}]");
        for p in permissions {
            println!(
                "  {:<22} {:<8} {}",
                p.name,
                if p.is_active { "active" } else { "inactive" },
                p.description
            );
        }
    }
    Ok(())
}

pub async fn toggle(base_dir: &Path, name: &str) -> Result<()> {
    let (_, service) = super::open_service(base_dir).await?;
    let permission = service.permissions().toggle(name).await?;
    println!(
        "{} is now {}",
        permission.name,
        if permission.is_active { "active" } else { "inactive" }
    );
    Ok(())
}
