#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("duplicate: {0}")]
    DuplicateName(String),

    #[error("invalid level {0}: must be between 0 and 100")]
    InvalidLevel(i64),

    #[error("unknown permission reference: {0}")]
    InvalidPermissionRef(String),

    #[error("role '{0}' cannot be modified")]
    RoleFrozen(String),

    #[error("role '{0}' is a system role and cannot be deleted")]
    RoleProtected(String),

    #[error("role '{0}' is still assigned to users")]
    RoleInUse(String),

    #[error("role missing or inactive")]
    RoleInvalid,

    #[error("permission '{0}' is still referenced by a role")]
    PermissionInUse(String),

    #[error("authentication required: no token provided")]
    TokenMissing,

    #[error("malformed or forged token")]
    TokenMalformed,

    #[error("token expired")]
    TokenExpired,

    #[error("principal not found")]
    PrincipalNotFound,

    #[error("principal is inactive")]
    PrincipalInactive,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("forbidden: missing permissions {required:?}")]
    Forbidden {
        required: Vec<String>,
        effective: Vec<String>,
    },

    #[error("setting '{0}' is not modifiable")]
    SettingLocked(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP-equivalent status a transport layer would pick for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::DuplicateName(_)
            | AuthError::RoleInUse(_)
            | AuthError::PermissionInUse(_) => 409,
            AuthError::InvalidLevel(_)
            | AuthError::InvalidPermissionRef(_)
            | AuthError::InvalidInput(_) => 400,
            AuthError::TokenMissing
            | AuthError::TokenMalformed
            | AuthError::TokenExpired
            | AuthError::PrincipalNotFound
            | AuthError::InvalidCredentials => 401,
            AuthError::RoleFrozen(_)
            | AuthError::RoleProtected(_)
            | AuthError::RoleInvalid
            | AuthError::PrincipalInactive
            | AuthError::SettingLocked(_)
            | AuthError::Forbidden { .. } => 403,
            AuthError::NotFound(_) => 404,
            AuthError::Config(_) | AuthError::Database(_) | AuthError::Internal(_) => 500,
        }
    }
}

impl From<rusqlite::Error> for AuthError {
    fn from(e: rusqlite::Error) -> Self {
        AuthError::Database(e.to_string())
    }
}
