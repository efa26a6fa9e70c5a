use crate::utils::AuthError;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier as _};

/// Hash-and-compare capability used for stored passwords
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError>;

    fn matches(&self, plaintext: &str, digest: &str) -> bool;
}

/// Argon2id with a random salt per hash, encoded as a PHC string
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AuthError::Unexpected(format!("failed to hash password: {e}")))?;
        Ok(password_hash.to_string())
    }

    fn matches(&self, plaintext: &str, digest: &str) -> bool {
        // An unparseable digest can never match
        let Ok(parsed_hash) = PasswordHash::new(digest) else {
            return false;
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }
}
