//! Argon2id implementation of the `PasswordHasher` port.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier as _};

use crate::domain::ports::{PasswordHashError, PasswordHasher};
use crate::domain::{Password, PasswordDigest};

/// Hashes passwords into PHC strings with Argon2id and a random salt.
#[derive(Default, Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &Password) -> Result<PasswordDigest, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.expose().as_bytes(), &salt)
            .map_err(|error| PasswordHashError::hashing(error.to_string()))?;
        Ok(PasswordDigest::new(hash.to_string()))
    }

    fn verify(
        &self,
        password: &Password,
        digest: &PasswordDigest,
    ) -> Result<bool, PasswordHashError> {
        let parsed = PasswordHash::new(digest.as_str())
            .map_err(|error| PasswordHashError::malformed_digest(error.to_string()))?;
        match self
            .argon2
            .verify_password(password.expose().as_bytes(), &parsed)
        {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(error) => Err(PasswordHashError::hashing(error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn hasher() -> Argon2PasswordHasher {
        Argon2PasswordHasher::new()
    }

    #[rstest]
    fn digests_verify_only_the_original_password(hasher: Argon2PasswordHasher) {
        let password = Password::new_secret("open sesame").expect("valid password");
        let digest = hasher.hash(&password).expect("hashing succeeds");
        assert!(digest.as_str().starts_with("$argon2id$"));

        assert!(hasher.verify(&password, &digest).expect("verify"));
        let wrong = Password::new_secret("open barley").expect("valid password");
        assert!(!hasher.verify(&wrong, &digest).expect("verify"));
    }

    #[rstest]
    fn salts_differ_between_hashes(hasher: Argon2PasswordHasher) {
        let password = Password::new_secret("open sesame").expect("valid password");
        let first = hasher.hash(&password).expect("hash");
        let second = hasher.hash(&password).expect("hash");
        assert_ne!(first.as_str(), second.as_str());
    }

    #[rstest]
    fn malformed_digest_is_reported(hasher: Argon2PasswordHasher) {
        let password = Password::new_secret("open sesame").expect("valid password");
        let err = hasher
            .verify(&password, &PasswordDigest::new("plaintext"))
            .expect_err("not a PHC string");
        assert_eq!(err.kind(), "malformed_digest");
    }
}
