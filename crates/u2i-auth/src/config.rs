use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::jwt::TokenSigner;

/// Top-level configuration stored as TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct U2iConfig {
    pub auth: AuthSettings,
    #[serde(default)]
    pub bootstrap: BootstrapSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Path to the SQLite database.
    pub db_path: String,
    /// HMAC secret used to sign bearer tokens.
    pub jwt_secret: String,
    /// Lifetime of an issued token, in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,
}

/// Initial administrative account created by the seeder. The operator is
/// expected to change the password after first login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapSettings {
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    #[serde(default = "default_admin_first_name")]
    pub admin_first_name: String,
    #[serde(default = "default_admin_last_name")]
    pub admin_last_name: String,
}

fn default_token_ttl_secs() -> u64 {
    24 * 3600
}
fn default_password_min_length() -> usize {
    6
}
fn default_admin_username() -> String {
    "admin".to_string()
}
fn default_admin_email() -> String {
    "admin@u2i.local".to_string()
}
fn default_admin_password() -> String {
    "Admin123!".to_string()
}
fn default_admin_first_name() -> String {
    "Admin".to_string()
}
fn default_admin_last_name() -> String {
    "U2I".to_string()
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_email: default_admin_email(),
            admin_password: default_admin_password(),
            admin_first_name: default_admin_first_name(),
            admin_last_name: default_admin_last_name(),
        }
    }
}

impl AuthSettings {
    pub fn token_signer(&self) -> Result<TokenSigner, AuthError> {
        TokenSigner::new(&self.jwt_secret, self.token_ttl_secs)
    }
}

impl U2iConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        if !path.exists() {
            return Err(AuthError::Config(format!(
                "configuration file not found at {}; run `u2i init` first",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| AuthError::Config(format!("read {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| AuthError::Config(e.to_string()))
    }

    /// Save config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), AuthError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| AuthError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AuthError::Config(format!("create {}: {e}", parent.display())))?;
        }
        std::fs::write(path, content)
            .map_err(|e| AuthError::Config(format!("write {}: {e}", path.display())))
    }

    /// Default config for `u2i init`, with a freshly generated signing secret.
    pub fn default_config(base_dir: &Path) -> Self {
        Self {
            auth: AuthSettings {
                db_path: base_dir.join("u2i.db").display().to_string(),
                jwt_secret: generate_secret(),
                token_ttl_secs: default_token_ttl_secs(),
                password_min_length: default_password_min_length(),
            },
            bootstrap: BootstrapSettings::default(),
        }
    }

    /// `<base_dir>/u2i.toml`
    pub fn default_path(base_dir: &Path) -> PathBuf {
        base_dir.join("u2i.toml")
    }

    /// `~/.u2i`
    pub fn default_base_dir() -> Result<PathBuf, AuthError> {
        dirs::home_dir()
            .map(|h| h.join(".u2i"))
            .ok_or_else(|| AuthError::Config("cannot determine home directory".to_string()))
    }
}

fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}
