//! Admin authorization
//!
//! Importing pages requires the admin token. Only its Argon2id hash is kept
//! in configuration; the `hash-token` binary produces it.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash an admin token as an Argon2id PHC string.
pub fn hash_token(token: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(token.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash token: {}", e))?;
    Ok(hash.to_string())
}

/// Check a token against a stored PHC hash.
///
/// Errors only when the stored hash itself cannot be parsed.
pub fn verify_token(token: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid token hash format: {}", e))
        .context("Failed to parse admin token hash")?;

    match Argon2::default().verify_password(token.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Token verification failed: {}", e)),
    }
}

/// Decides whether a request may manage pages.
pub struct AdminAuthorizer {
    token_hash: Option<String>,
}

impl AdminAuthorizer {
    pub fn new(token_hash: Option<String>) -> Self {
        if token_hash.is_none() {
            tracing::warn!("No admin token hash configured; imports are disabled");
        }
        Self { token_hash }
    }

    /// `true` only when a token was presented and matches the configured hash.
    pub fn is_authorized(&self, token: Option<&str>) -> bool {
        let (Some(hash), Some(token)) = (self.token_hash.as_deref(), token) else {
            return false;
        };
        if token.is_empty() {
            return false;
        }

        match verify_token(token, hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::error!("Admin token check failed: {:#}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_produces_argon2id() {
        let hash = hash_token("admin-token").expect("Failed to hash token");
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("admin-token"));
    }

    #[test]
    fn test_hash_token_is_salted() {
        let a = hash_token("same").unwrap();
        let b = hash_token("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_token() {
        let hash = hash_token("correct").unwrap();
        assert!(verify_token("correct", &hash).unwrap());
        assert!(!verify_token("wrong", &hash).unwrap());
    }

    #[test]
    fn test_verify_token_invalid_hash() {
        assert!(verify_token("token", "not-a-hash").is_err());
    }

    #[test]
    fn test_authorizer_accepts_matching_token() {
        let authorizer = AdminAuthorizer::new(Some(hash_token("secret").unwrap()));
        assert!(authorizer.is_authorized(Some("secret")));
        assert!(!authorizer.is_authorized(Some("guess")));
        assert!(!authorizer.is_authorized(Some("")));
        assert!(!authorizer.is_authorized(None));
    }

    #[test]
    fn test_authorizer_without_hash_denies_everyone() {
        let authorizer = AdminAuthorizer::new(None);
        assert!(!authorizer.is_authorized(Some("anything")));
    }

    #[test]
    fn test_authorizer_with_corrupt_hash_denies() {
        let authorizer = AdminAuthorizer::new(Some("$corrupt".to_string()));
        assert!(!authorizer.is_authorized(Some("anything")));
    }
}
