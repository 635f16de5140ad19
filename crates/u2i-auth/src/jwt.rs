use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::types::Credential;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CredentialClaims {
    /// Principal id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Mints and checks HS256 bearer tokens with a fixed time-to-live.
///
/// There is no revocation list: a token stays valid until it expires or its
/// principal disappears or is deactivated.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_secs: u64) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Config("jwt secret must not be empty".into()));
        }
        let ttl_secs = i64::try_from(ttl_secs)
            .map_err(|_| AuthError::Config(format!("token ttl {ttl_secs} out of range")))?;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        })
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn issue(&self, principal_id: &str) -> Result<Credential, AuthError> {
        self.issue_at(principal_id, chrono::Utc::now().timestamp())
    }

    pub fn issue_at(&self, principal_id: &str, now: i64) -> Result<Credential, AuthError> {
        let exp = now.checked_add(self.ttl_secs).ok_or_else(|| {
            AuthError::Config(format!("token ttl {} overflows the expiry", self.ttl_secs))
        })?;
        let claims = CredentialClaims {
            sub: principal_id.to_string(),
            iat: now,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode error: {e}")))?;
        Ok(Credential {
            token,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    pub fn verify(&self, token: &str) -> Result<CredentialClaims, AuthError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Signature first, then expiry with no leeway: a token is expired from
    /// the second `exp` is reached.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<CredentialClaims, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::TokenMissing);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        let claims = decode::<CredentialClaims>(token, &self.decoding, &validation)
            .map_err(|_| AuthError::TokenMalformed)?
            .claims;

        if now >= claims.exp {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }
}

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = match header.map(str::trim) {
        None | Some("") | Some("Bearer") => return Err(AuthError::TokenMissing),
        Some(h) => h,
    };
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::TokenMalformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issued_token_verifies_to_same_principal() {
        let signer = TokenSigner::new(SECRET, 3600).unwrap();
        let cred = signer.issue("user-42").unwrap();
        assert_eq!(cred.expires_at - cred.issued_at, 3600);

        let claims = signer.verify(&cred.token).unwrap();
        assert_eq!(claims.sub, "user-42");
    }

    #[test]
    fn zero_ttl_is_expired_immediately() {
        let signer = TokenSigner::new(SECRET, 0).unwrap();
        let cred = signer.issue("user-42").unwrap();
        assert!(matches!(signer.verify(&cred.token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn expires_once_ttl_elapses() {
        let signer = TokenSigner::new(SECRET, 60).unwrap();
        let cred = signer.issue_at("user-42", 1_000_000).unwrap();
        assert!(signer.verify_at(&cred.token, 1_000_059).is_ok());
        assert!(matches!(
            signer.verify_at(&cred.token, 1_000_060),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = TokenSigner::new(SECRET, 3600).unwrap();
        let theirs = TokenSigner::new("another-secret", 3600).unwrap();
        let cred = theirs.issue("user-42").unwrap();
        assert!(matches!(ours.verify(&cred.token), Err(AuthError::TokenMalformed)));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let signer = TokenSigner::new(SECRET, 3600).unwrap();
        let cred = signer.issue("user-42").unwrap();
        let forged = signer.issue("user-1").unwrap();
        let forged_payload = forged.token.split('.').nth(1).unwrap().to_string();
        let mut parts: Vec<&str> = cred.token.split('.').collect();
        parts[1] = &forged_payload;
        let tampered = parts.join(".");
        assert!(matches!(signer.verify(&tampered), Err(AuthError::TokenMalformed)));
    }

    #[test]
    fn garbage_and_empty_tokens() {
        let signer = TokenSigner::new(SECRET, 3600).unwrap();
        assert!(matches!(signer.verify("not.a.jwt"), Err(AuthError::TokenMalformed)));
        assert!(matches!(signer.verify(""), Err(AuthError::TokenMissing)));
    }

    #[test]
    fn empty_secret_is_a_config_error() {
        assert!(matches!(TokenSigner::new("", 60), Err(AuthError::Config(_))));
    }

    #[test]
    fn oversized_ttl_is_a_config_error() {
        let signer = TokenSigner::new(SECRET, i64::MAX as u64).unwrap();
        assert!(matches!(signer.issue("user-42"), Err(AuthError::Config(_))));
        assert!(matches!(
            TokenSigner::new(SECRET, u64::MAX),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert!(matches!(bearer_token(None), Err(AuthError::TokenMissing)));
        assert!(matches!(bearer_token(Some("Bearer ")), Err(AuthError::TokenMissing)));
        assert!(matches!(bearer_token(Some("Basic abc")), Err(AuthError::TokenMalformed)));
    }
}
