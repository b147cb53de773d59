//! Password hashing using Argon2id.

use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher as _, SaltString},
};

use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::account::{PasswordCredential, PasswordHasher};

/// Argon2id with default parameters. The PHC hash string embeds the salt and
/// parameters; the salt is also returned separately because the account
/// record stores both halves of the credential.
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> AppResult<PasswordCredential> {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|_| AppError::Internal("Failed to hash password".to_string()))?
            .to_string();

        Ok(PasswordCredential {
            hash,
            salt: salt.to_string(),
        })
    }

    fn verify(&self, plaintext: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|_| AppError::Internal("Invalid password hash format".to_string()))?;

        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }
}
