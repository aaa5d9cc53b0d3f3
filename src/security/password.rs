//! Argon2id password hashing, run on the blocking pool

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::core::error::StoreError;

#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// OWASP minimum: 19 MiB, 2 passes, 1 lane
    const MEMORY_COST: u32 = 19_456;
    const TIME_COST: u32 = 2;
    const PARALLELISM: u32 = 1;
    const OUTPUT_LEN: usize = 32;

    pub fn new() -> Self {
        Self {
            params: Params::new(
                Self::MEMORY_COST,
                Self::TIME_COST,
                Self::PARALLELISM,
                Some(Self::OUTPUT_LEN),
            )
            .unwrap_or_default(),
        }
    }

    /// Custom costs, e.g. cheap parameters for tests
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, StoreError> {
        let params = Params::new(memory_kib, iterations, parallelism, Some(Self::OUTPUT_LEN))
            .map_err(|e| StoreError::Hashing(e.to_string()))?;
        Ok(Self { params })
    }

    pub async fn hash(&self, password: String) -> Result<String, StoreError> {
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Password hash task panicked");
            StoreError::Hashing(e.to_string())
        })?
        .map_err(|e| StoreError::Hashing(e.to_string()))
    }

    /// `false` for a mismatch or an unparseable stored hash
    pub async fn verify(&self, password: String, stored: String) -> Result<bool, StoreError> {
        tokio::task::spawn_blocking(move || {
            let parsed = match PasswordHash::new(&stored) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored password hash is malformed");
                    return false;
                }
            };
            // Costs are read back from the PHC string
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .await
        .map_err(|e| StoreError::Hashing(e.to_string()))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
