use std::{env, sync::Arc};

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier as _, Version,
};
use tokio::sync::OnceCell;

use crate::errors::ModelError;

/// Argon2id password hashing.
///
/// Hashes are PHC strings (`$argon2id$v=19$m=...`) carrying their own salt and parameters,
/// stored as raw bytes. Verification reads the parameters back from the stored hash, so
/// changing the configured cost does not invalidate existing accounts.
#[derive(Clone, Debug)]
pub struct PasswordHasher {
    params: Params,
    dummy_hash: Arc<OnceCell<Vec<u8>>>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl PasswordHasher {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Memory cost in KiB, iterations and lanes
    pub fn with_cost(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, ModelError> {
        Ok(Self::new(Params::new(m_cost, t_cost, p_cost, None)?))
    }

    /// Reads `PASSWORD_HASH_MEMORY_KIB`, `PASSWORD_HASH_ITERATIONS` and
    /// `PASSWORD_HASH_PARALLELISM`, falling back to the argon2 defaults
    pub fn from_env() -> Result<Self, ModelError> {
        let m_cost = env_u32("PASSWORD_HASH_MEMORY_KIB", Params::DEFAULT_M_COST)?;
        let t_cost = env_u32("PASSWORD_HASH_ITERATIONS", Params::DEFAULT_T_COST)?;
        let p_cost = env_u32("PASSWORD_HASH_PARALLELISM", Params::DEFAULT_P_COST)?;
        Self::with_cost(m_cost, t_cost, p_cost)
    }

    pub async fn create_hash(&self, password: &str) -> Result<Vec<u8>, ModelError> {
        let params = self.params.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hash_blocking(params, &password)).await?
    }

    /// `Ok(false)` on mismatch; `Err` only when the stored hash cannot be parsed
    pub async fn verify(&self, password: &str, hash: &[u8]) -> Result<bool, ModelError> {
        let params = self.params.clone();
        let password = password.to_owned();
        let hash = hash.to_vec();
        tokio::task::spawn_blocking(move || verify_blocking(params, &password, &hash)).await?
    }

    /// Spends one verification against a throwaway hash, so a lookup miss costs about
    /// as much time as a wrong password
    pub async fn verify_dummy(&self, password: &str) -> Result<(), ModelError> {
        let dummy = self.dummy().await?;
        self.verify(password, dummy).await?;
        Ok(())
    }

    /// Builds the throwaway hash ahead of the first lookup miss
    pub async fn warm_up(&self) -> Result<(), ModelError> {
        self.dummy().await.map(|_| ())
    }

    #[cfg(test)]
    pub(crate) fn is_warm(&self) -> bool {
        self.dummy_hash.initialized()
    }

    async fn dummy(&self) -> Result<&[u8], ModelError> {
        self.dummy_hash
            .get_or_try_init(|| self.create_hash("snippetbox-dummy-password"))
            .await
            .map(Vec::as_slice)
    }
}

fn argon2(params: Params) -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

fn hash_blocking(params: Params, password: &str) -> Result<Vec<u8>, ModelError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2(params).hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string().into_bytes())
}

fn verify_blocking(params: Params, password: &str, hash: &[u8]) -> Result<bool, ModelError> {
    let encoded = std::str::from_utf8(hash)
        .map_err(|e| ModelError::Storage(format!("Stored password hash is not UTF-8: {e}")))?;
    let parsed = PasswordHash::new(encoded)?;

    match argon2(params).verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn env_u32(key: &str, default: u32) -> Result<u32, ModelError> {
    match env::var(key) {
        Ok(v) => v
            .parse::<u32>()
            .map_err(|e| ModelError::Storage(format!("Invalid {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fast_hasher;

    #[tokio::test]
    async fn test_hash_is_phc_argon2id_and_not_plaintext() {
        let hasher = fast_hasher();

        let hash = hasher
            .create_hash("pa$$word")
            .await
            .expect("hashing should succeed");
        let encoded = String::from_utf8(hash).expect("hash should be UTF-8");

        assert!(encoded.starts_with("$argon2id$v=19$"));
        assert!(!encoded.contains("pa$$word"));
    }

    #[tokio::test]
    async fn test_same_password_gets_distinct_salts() {
        let hasher = fast_hasher();

        let first = hasher.create_hash("secret").await.unwrap();
        let second = hasher.create_hash("secret").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_verify_match_and_mismatch() {
        let hasher = fast_hasher();
        let hash = hasher.create_hash("correct horse").await.unwrap();

        assert!(hasher.verify("correct horse", &hash).await.unwrap());
        assert!(!hasher.verify("battery staple", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_uses_parameters_from_stored_hash() {
        // A hash made with different cost settings still verifies
        let old = PasswordHasher::with_cost(2048, 2, 1).unwrap();
        let hash = old.create_hash("migrated").await.unwrap();

        assert!(fast_hasher().verify("migrated", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_malformed_hash_is_storage_error() {
        let result = fast_hasher().verify("anything", b"not-a-phc-string").await;
        assert!(matches!(result, Err(ModelError::Storage(_))));
    }

    #[tokio::test]
    async fn test_verify_dummy_succeeds_for_any_password() {
        let hasher = fast_hasher();

        hasher.verify_dummy("whatever").await.unwrap();
        // The dummy hash is reused
        let first = hasher.dummy_hash.get().cloned();
        hasher.verify_dummy("again").await.unwrap();
        assert_eq!(first, hasher.dummy_hash.get().cloned());
    }

    #[tokio::test]
    async fn test_warm_up_prepares_dummy_hash_once() {
        let hasher = fast_hasher();
        assert!(!hasher.is_warm());

        hasher.warm_up().await.unwrap();
        assert!(hasher.is_warm());

        let warmed = hasher.dummy_hash.get().cloned();
        hasher.verify_dummy("whatever").await.unwrap();
        assert_eq!(warmed, hasher.dummy_hash.get().cloned());
    }

    #[test]
    fn test_with_cost_rejects_invalid_params() {
        // Memory below 8 KiB per lane is not allowed
        let result = PasswordHasher::with_cost(1, 1, 1);
        assert!(matches!(result, Err(ModelError::Storage(_))));
    }
}
