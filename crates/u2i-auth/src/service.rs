//! Entry points used by request handlers: `authenticate`, `authorize` and
//! `login`, plus access to the administrative managers.

use std::sync::Arc;

use crate::config::{AuthSettings, BootstrapSettings};
use crate::error::AuthError;
use crate::evaluator::{self, Decision};
use crate::jwt::{TokenSigner, bearer_token};
use crate::password::verify_password;
use crate::registry::PermissionRegistry;
use crate::roles::RoleManager;
use crate::settings::SettingsManager;
use crate::store::AuthStore;
use crate::store::seed::{SeedReport, seed_defaults};
use crate::types::{CreateUserRequest, Principal, Session, User};
use crate::users::UserManager;

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn AuthStore>,
    signer: TokenSigner,
    permissions: PermissionRegistry,
    roles: RoleManager,
    users: UserManager,
    settings: SettingsManager,
}

impl AuthService {
    pub fn new(store: Arc<dyn AuthStore>, signer: TokenSigner, password_min_length: usize) -> Self {
        Self {
            permissions: PermissionRegistry::new(store.clone()),
            roles: RoleManager::new(store.clone()),
            users: UserManager::new(store.clone(), password_min_length),
            settings: SettingsManager::new(store.clone()),
            store,
            signer,
        }
    }

    pub fn from_settings(
        store: Arc<dyn AuthStore>,
        settings: &AuthSettings,
    ) -> Result<Self, AuthError> {
        Ok(Self::new(
            store,
            settings.token_signer()?,
            settings.password_min_length,
        ))
    }

    pub fn store(&self) -> &Arc<dyn AuthStore> {
        &self.store
    }

    pub fn permissions(&self) -> &PermissionRegistry {
        &self.permissions
    }

    pub fn roles(&self) -> &RoleManager {
        &self.roles
    }

    pub fn users(&self) -> &UserManager {
        &self.users
    }

    pub fn settings(&self) -> &SettingsManager {
        &self.settings
    }

    /// Resolve a bearer token to an active principal with its role and the
    /// current state of the role's permissions.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.signer.verify(token)?;
        let user = match self.store.get_user_by_id(&claims.sub).await {
            Ok(u) => u,
            Err(AuthError::NotFound(_)) => return Err(AuthError::PrincipalNotFound),
            Err(e) => return Err(e),
        };
        if !user.is_active {
            return Err(AuthError::PrincipalInactive);
        }
        self.resolve_principal(user).await
    }

    /// Same as [`authenticate`](Self::authenticate), from a raw
    /// `Authorization` header value.
    pub async fn authenticate_header(&self, header: Option<&str>) -> Result<Principal, AuthError> {
        let token = bearer_token(header)?;
        self.authenticate(token).await
    }

    pub fn authorize<S: AsRef<str>>(&self, principal: &Principal, required: &[S]) -> Decision {
        evaluator::authorize(principal, required)
    }

    /// `login` is a username or an email. Unknown accounts and wrong
    /// passwords are indistinguishable to the caller.
    pub async fn login(&self, login: &str, password: &str) -> Result<Session, AuthError> {
        let login = login.trim();
        let user = match self.store.get_user_by_login(login).await {
            Ok(u) => u,
            Err(AuthError::NotFound(_)) => {
                tracing::warn!(login, "login for unknown account");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };
        if !user.is_active {
            tracing::warn!(user = %user.username, "login for inactive account");
            return Err(AuthError::PrincipalInactive);
        }

        let stored = self.store.get_password_hash(&user.id).await?;
        if !verify_password(password, &stored)? {
            tracing::warn!(user = %user.username, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.store.touch_last_login(&user.id).await?;
        let user = self.store.get_user_by_id(&user.id).await?;
        let credential = self.signer.issue(&user.id)?;
        tracing::info!(user = %user.username, "login succeeded");
        let principal = self.resolve_principal(user).await?;
        Ok(Session {
            principal,
            credential,
        })
    }

    /// Self-registration: creates the account with the default user role and
    /// signs it in. `req.role_id` is ignored; choosing a role is an
    /// administrative operation through [`UserManager::create`].
    pub async fn register(&self, req: &CreateUserRequest) -> Result<Session, AuthError> {
        if req.role_id.is_some() {
            tracing::warn!(user = %req.username, "ignoring role requested at self-registration");
        }
        let req = CreateUserRequest {
            role_id: None,
            ..req.clone()
        };
        let user = self.users.create(&req).await?;
        let credential = self.signer.issue(&user.id)?;
        let principal = self.resolve_principal(user).await?;
        Ok(Session {
            principal,
            credential,
        })
    }

    pub async fn seed(&self, bootstrap: &BootstrapSettings) -> Result<SeedReport, AuthError> {
        seed_defaults(self.store.as_ref(), bootstrap).await
    }

    /// Join a user with its role and permissions. A dangling role reference
    /// yields a principal without a role, which the evaluator denies.
    pub async fn resolve_principal(&self, user: User) -> Result<Principal, AuthError> {
        let role = match self.store.resolve_role(&user.role_id).await {
            Ok(r) => Some(r),
            Err(AuthError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        Ok(Principal { user, role })
    }
}
