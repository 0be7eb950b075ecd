//! Password hashing and verification using Argon2id.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::error::Error;

/// One-way, salted password digests.
///
/// Digests are PHC strings, so the salt and cost parameters travel with them and `verify`
/// keeps working for digests produced under older parameters.
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    params: Params,
}

impl Default for CredentialVerifier {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl CredentialVerifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit Argon2 cost parameters.
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    /// Override only the memory cost (KiB), keeping the default time and parallelism.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if Argon2 rejects the cost.
    pub fn with_memory_cost(m_cost: u32) -> Result<Self, Error> {
        let params = Params::new(
            m_cost,
            Params::DEFAULT_T_COST,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| Error::Config(format!("PASSWORD_HASH_COST: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PasswordHash`] if Argon2 fails.
    pub fn hash(&self, password: &str) -> Result<String, Error> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::PasswordHash(e.to_string()))
    }

    /// Check a password against a stored digest.
    ///
    /// A malformed digest never authenticates: it verifies as `false`.
    #[must_use]
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            tracing::warn!(operation = "credentials: verify", "stored password digest is malformed");
            return false;
        };
        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// [`hash`](Self::hash) on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PasswordHash`] on hashing failure, [`Error::Internal`] if the task panics.
    pub async fn hash_blocking(&self, password: String) -> Result<String, Error> {
        let verifier = self.clone();
        tokio::task::spawn_blocking(move || verifier.hash(&password)).await?
    }

    /// [`verify`](Self::verify) on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the task panics.
    pub async fn verify_blocking(&self, password: String, digest: String) -> Result<bool, Error> {
        let verifier = self.clone();
        Ok(tokio::task::spawn_blocking(move || verifier.verify(&password, &digest)).await?)
    }
}

#[cfg(test)]
pub(crate) fn fast_verifier() -> CredentialVerifier {
    CredentialVerifier::with_params(Params::new(8, 1, 1, None).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let verifier = fast_verifier();
        let hash = verifier.hash("correct-horse-battery").unwrap();

        assert!(hash.starts_with("$argon2id"));
        assert!(verifier.verify("correct-horse-battery", &hash));
        assert!(!verifier.verify("wrong-password", &hash));
    }

    #[test]
    fn repeated_hashes_differ() {
        let verifier = fast_verifier();
        let h1 = verifier.hash("same-password").unwrap();
        let h2 = verifier.hash("same-password").unwrap();

        assert_ne!(h1, h2);
        assert!(verifier.verify("same-password", &h1));
        assert!(verifier.verify("same-password", &h2));
    }

    #[test]
    fn malformed_digest_is_rejected() {
        let verifier = fast_verifier();
        assert!(!verifier.verify("password", "not-a-valid-hash"));
        assert!(!verifier.verify("password", ""));
    }

    #[test]
    fn digest_from_other_params_still_verifies() {
        let hash = fast_verifier().hash("password123").unwrap();
        let other = CredentialVerifier::with_params(Params::new(16, 2, 1, None).unwrap());
        assert!(other.verify("password123", &hash));
    }

    #[test]
    fn memory_cost_below_minimum_is_config_error() {
        assert!(matches!(
            CredentialVerifier::with_memory_cost(1),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn blocking_wrappers_agree() {
        let verifier = fast_verifier();
        let hash = verifier.hash_blocking("password123".into()).await.unwrap();
        assert!(verifier
            .verify_blocking("password123".into(), hash.clone())
            .await
            .unwrap());
        assert!(!verifier
            .verify_blocking("password124".into(), hash)
            .await
            .unwrap());
    }
}
