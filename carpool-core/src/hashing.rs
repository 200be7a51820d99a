//! Argon2id password hashing.
//!
//! Hashing and verification are deliberately slow, so both run on the blocking
//! thread pool instead of stalling the async workers.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use carpool_shared::Masked;
use serde::Deserialize;
use tracing::{debug, error};
use crate::{CoreError, CoreResult};

/// Argon2 cost parameters, read from the `password` config section.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PasswordCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl PasswordCost {
    /// Cheapest parameters argon2 accepts. For tests only.
    pub fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Argon2id hasher with fixed cost parameters.
///
/// A fault inside argon2 or its blocking task is reported as
/// `CoreError::PersistenceError` (clients see "Database error"); the log line names it
/// as a hashing failure.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    // Verified against when an email is unknown so that lookups for missing
    // accounts take as long as a wrong password.
    decoy_hash: String,
}

impl PasswordHasher {
    pub fn new(cost: PasswordCost) -> CoreResult<Self> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| CoreError::ValidationError(format!("Invalid password cost: {}", e)))?;
        let decoy_hash = hash_with(&params, "decoy-password-for-unknown-accounts")?;
        Ok(Self { params, decoy_hash })
    }

    pub async fn hash(&self, password: Masked<String>) -> CoreResult<String> {
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || hash_with(&params, password.expose()))
            .await
            .map_err(|e| {
                error!(error = %e, "Password hashing task failed");
                CoreError::PersistenceError(format!("Hashing task failed: {}", e))
            })?
    }

    /// Constant-time comparison of `password` against a stored PHC string.
    pub async fn verify(&self, password: Masked<String>, stored: Masked<String>) -> CoreResult<bool> {
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || verify_with(&params, password.expose(), stored.expose()))
            .await
            .map_err(|e| {
                error!(error = %e, "Password verification task failed");
                CoreError::PersistenceError(format!("Verification task failed: {}", e))
            })?
    }

    /// Burns the same work as a real verification and always fails.
    pub async fn verify_decoy(&self, password: Masked<String>) -> CoreResult<bool> {
        self.verify(password, Masked(self.decoy_hash.clone()))
            .await
            .map(|_| false)
    }
}

fn argon2(params: &Params) -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
}

fn hash_with(params: &Params, password: &str) -> CoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    argon2(params)
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "Argon2 password hashing failed");
            CoreError::PersistenceError(format!("Password hashing failed: {}", e))
        })
}

fn verify_with(params: &Params, password: &str, stored: &str) -> CoreResult<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "Stored password hash is malformed");
        CoreError::PersistenceError(format!("Invalid stored password hash: {}", e))
    })?;

    match argon2(params).verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => {
            debug!("Password mismatch");
            Ok(false)
        }
        Err(e) => {
            error!(error = %e, "Argon2 verification failed");
            Err(CoreError::PersistenceError(format!("Password verification failed: {}", e)))
        }
    }
}
