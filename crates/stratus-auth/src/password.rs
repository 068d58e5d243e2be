//! Credential hashing with Argon2id.

use crate::error::{AuthError, AuthResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as Argon2PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};

/// Salted, computationally expensive credential hasher.
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher {
    /// Argon2id with the recommended parameters:
    /// m_cost 19MB, t_cost 2 iterations, p_cost 1 thread.
    pub fn new() -> Self {
        let params = Params::new(19456, 2, 1, None).expect("Invalid Argon2 parameters");
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);
        Self { argon2 }
    }

    /// Hash a credential into a PHC string.
    pub fn hash(&self, credential: &str) -> AuthResult<String> {
        if credential.is_empty() {
            return Err(AuthError::Configuration(
                "credential cannot be empty".to_string(),
            ));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(credential.as_bytes(), &salt)
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verify a credential against a stored PHC hash.
    pub fn verify(&self, credential: &str, hash: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hash(e.to_string()))?;
        match self.argon2.verify_password(credential.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Hash(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("correct horse battery staple").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse battery staple", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn test_empty_credential_rejected() {
        let hasher = PasswordHasher::new();
        assert!(hasher.hash("").is_err());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = PasswordHasher::new();
        let a = hasher.hash("same").unwrap();
        let b = hasher.hash("same").unwrap();
        assert_ne!(a, b);
    }
}
