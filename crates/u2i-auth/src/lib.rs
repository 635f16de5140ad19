pub mod catalog;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod jwt;
pub mod password;
pub mod registry;
pub mod roles;
pub mod service;
pub mod settings;
pub mod store;
pub mod types;
pub mod users;

pub use catalog::{ADMIN_ACCESS, DEFAULT_USER_ROLE, PERMISSIONS, TOP_ADMIN_ROLE};
pub use config::{AuthSettings, BootstrapSettings, U2iConfig};
pub use error::AuthError;
pub use evaluator::{Decision, DenyReason, Denial, authorize, evaluate};
pub use jwt::{CredentialClaims, TokenSigner, bearer_token};
pub use password::{hash_password, verify_password};
pub use registry::PermissionRegistry;
pub use roles::RoleManager;
pub use service::AuthService;
pub use settings::SettingsManager;
pub use store::seed::{SeedReport, seed_defaults};
pub use store::{AuthStore, SqliteAuthStore};
pub use types::*;
pub use users::UserManager;
