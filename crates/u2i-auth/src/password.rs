use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::AuthError;

/// Hash with Argon2id at the crate's default cost. The PHC string embeds its
/// own random salt, so two hashes of the same password never match.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("password hash error: {e}")))
}

/// Check `candidate` against a stored PHC hash. A stored value that is not a
/// valid hash is an internal error, not a mismatch.
pub fn verify_password(candidate: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AuthError::Internal(format!("invalid stored password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok())
}

pub fn check_password_policy(password: &str, min_length: usize) -> Result<(), AuthError> {
    if password.chars().count() < min_length {
        return Err(AuthError::InvalidInput(format!(
            "password must be at least {min_length} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rehash_after_change_rejects_old_password() {
        let stored = hash_password("Admin123!").unwrap();
        assert!(verify_password("Admin123!", &stored).unwrap());

        let stored = hash_password("NewPass1!").unwrap();
        assert!(!verify_password("Admin123!", &stored).unwrap());
        assert!(verify_password("NewPass1!", &stored).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-secret").unwrap();
        let b = hash_password("same-secret").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(!a.contains("same-secret"));
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(verify_password("x", "not-a-phc-string").is_err());
    }

    #[test]
    fn policy_counts_characters() {
        assert!(check_password_policy("abcde", 6).is_err());
        assert!(check_password_policy("abcdef", 6).is_ok());
        assert!(check_password_policy("éééééé", 6).is_ok());
    }
}
