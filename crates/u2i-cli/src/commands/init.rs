use anyhow::Result;
use std::path::Path;

use u2i_auth::U2iConfig;

pub async fn run(base_dir: &Path) -> Result<()> {
    println!("Initializing U2I in {}", base_dir.display());

    std::fs::create_dir_all(base_dir)?;

    let config_path = U2iConfig::default_path(base_dir);
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
    } else {
        let config = U2iConfig::default_config(base_dir);
        config.save(&config_path)?;
        println!("Created config: {}", config_path.display());
    }

    let (config, service) = super::open_service(base_dir).await?;
    println!("Initialized database: {}", config.auth.db_path);

    let report = service.seed(&config.bootstrap).await?;
    super::seed::print_report(&report);

    println!("\nU2I initialized. Next steps:");
    println!(
        "  1. Run `u2i login {}` to get a token",
        config.bootstrap.admin_username
    );
    println!("  2. Change the bootstrap password with `u2i users passwd`");

    Ok(())
}
