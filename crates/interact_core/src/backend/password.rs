//! Password hashing for the local auth store.
//!
//! Stored values are Argon2 PHC strings; each carries its own salt and
//! parameters.

use super::{BackendError, BackendResult};
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use uuid::Uuid;

/// Hashes `password` with a fresh random salt.
pub(crate) fn hash_password(password: &str) -> BackendResult<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|err| BackendError::PasswordHash(format!("failed to create salt: {err}")))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| BackendError::PasswordHash(format!("failed to hash password: {err}")))
}

/// Checks `password` against a stored PHC string. Unparseable hashes never match.
pub(crate) fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};

    #[test]
    fn hash_is_salted_phc_string() {
        let first = hash_password("secret").expect("hash");
        let second = hash_password("secret").expect("hash");
        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
    }

    #[test]
    fn verify_accepts_only_matching_password() {
        let stored = hash_password("hunter2").expect("hash");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }
}
