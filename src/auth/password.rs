//! Password hashing
//!
//! Argon2id with a random per-password salt, stored as a PHC string.
//! Hashing is CPU-bound; callers in async context go through
//! [`hash_password_blocking`] / [`verify_password_blocking`] so the work runs
//! on tokio's blocking pool.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;
use rand_core::OsRng;

use crate::error::AppError;

/// Verified against when the login handle is unknown, so both failure paths
/// do the same amount of work.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
    hash_password("dummy-password-for-timing").unwrap_or_default()
});

/// Minimum/maximum password length, counted in characters
#[derive(Debug, Clone, Copy)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl PasswordPolicy {
    pub fn check(&self, password: &str) -> Result<(), AppError> {
        let len = password.chars().count();
        if password.trim().is_empty() {
            return Err(AppError::WeakCredential("password must not be empty".into()));
        }
        if len < self.min_length {
            return Err(AppError::WeakCredential(format!(
                "password must be at least {} characters",
                self.min_length
            )));
        }
        if len > self.max_length {
            return Err(AppError::WeakCredential(format!(
                "password must be at most {} characters",
                self.max_length
            )));
        }
        Ok(())
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {}", e)))
}

/// Returns `false` for a wrong password or an unparsable stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("stored password hash is malformed: {}", e);
            false
        }
    }
}

pub async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(AppError::internal)?
}

/// Verify against `stored_hash`, or against a dummy hash when there is no
/// user, always returning `false` in that case.
pub async fn verify_password_blocking(
    password: String,
    stored_hash: Option<String>,
) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            let _ = verify_password(&password, &DUMMY_HASH);
            false
        }
    })
    .await
    .map_err(AppError::internal)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: PasswordPolicy = PasswordPolicy {
        min_length: 8,
        max_length: 16,
    };

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2hunter2", &hash));
        assert!(!verify_password("hunter2hunter3", &hash));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_policy_bounds() {
        assert!(POLICY.check("12345678").is_ok());
        assert!(matches!(POLICY.check(""), Err(AppError::WeakCredential(_))));
        assert!(matches!(POLICY.check("        "), Err(AppError::WeakCredential(_))));
        assert!(matches!(POLICY.check("short"), Err(AppError::WeakCredential(_))));
        assert!(matches!(
            POLICY.check(&"x".repeat(17)),
            Err(AppError::WeakCredential(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_user_never_verifies() {
        assert!(
            !verify_password_blocking("dummy-password-for-timing".into(), None)
                .await
                .unwrap()
        );
    }
}
