pub mod init;
pub mod permissions;
pub mod roles;
pub mod seed;
pub mod session;
pub mod users;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use u2i_auth::{AuthService, AuthStore, SqliteAuthStore, U2iConfig};

/// Load the config under `base_dir` and open a migrated store behind a service.
pub async fn open_service(base_dir: &Path) -> Result<(U2iConfig, AuthService)> {
    let config_path = U2iConfig::default_path(base_dir);
    let config = U2iConfig::load(&config_path)?;
    let store = SqliteAuthStore::open(&config.auth.db_path)?;
    store.migrate().await?;
    let store: Arc<dyn AuthStore> = Arc::new(store);
    let service = AuthService::from_settings(store, &config.auth)?;
    Ok((config, service))
}
