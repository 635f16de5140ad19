use anyhow::Result;
use std::path::Path;

use u2i_auth::SeedReport;

pub async fn run(base_dir: &Path) -> Result<()> {
    let (config, service) = super::open_service(base_dir).await?;
    let report = service.seed(&config.bootstrap).await?;
    print_report(&report);
    Ok(())
}

pub fn print_report(report: &SeedReport) {
    if report.is_empty() {
        println!("Defaults already present, nothing seeded.");
        return;
    }
    println!("Seeded:");
    println!("  Permissions: {}", report.permissions_created);
    println!("  Roles:       {}", report.roles_created);
    println!("  Users:       {}", report.users_created);
    println!("  Settings:    {}", report.settings_created);
}
