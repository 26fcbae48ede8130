//! Argon2id implementation of the `CredentialHasher` port.
//!
//! Digests are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`), so the
//! salt and cost parameters travel with the digest and verification honours
//! whatever cost a digest was created with.

use std::fmt;

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::domain::ports::{CredentialHasher, CredentialHasherError};
use crate::domain::{CredentialDigest, Secret};

/// Argon2id work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes over memory.
    pub iterations: u32,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl HashCost {
    /// 64 MiB of memory.
    pub const DEFAULT_MEMORY_KIB: u32 = 64 * 1024;
    /// Three passes.
    pub const DEFAULT_ITERATIONS: u32 = 3;
    /// A single lane.
    pub const DEFAULT_PARALLELISM: u32 = 1;
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Self::DEFAULT_MEMORY_KIB,
            iterations: Self::DEFAULT_ITERATIONS,
            parallelism: Self::DEFAULT_PARALLELISM,
        }
    }
}

/// Salted Argon2id credential hasher.
#[derive(Clone)]
pub struct Argon2CredentialHasher {
    argon2: Argon2<'static>,
    cost: HashCost,
}

impl fmt::Debug for Argon2CredentialHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2CredentialHasher")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

impl Argon2CredentialHasher {
    /// Build a hasher for new digests at `cost`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialHasherError::Hashing`] when Argon2 rejects the
    /// parameters (for example zero iterations or too little memory for the
    /// requested parallelism).
    pub fn new(cost: HashCost) -> Result<Self, CredentialHasherError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|err| CredentialHasherError::hashing(format!("invalid hash cost: {err}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            cost,
        })
    }

    /// Work factor applied to new digests.
    pub fn cost(&self) -> HashCost {
        self.cost
    }
}

impl CredentialHasher for Argon2CredentialHasher {
    fn hash(&self, secret: &Secret) -> Result<CredentialDigest, CredentialHasherError> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = self
            .argon2
            .hash_password(secret.expose().as_bytes(), &salt)
            .map_err(|err| CredentialHasherError::hashing(err.to_string()))?;
        CredentialDigest::new(hash.to_string())
            .map_err(|err| CredentialHasherError::hashing(err.to_string()))
    }

    fn verify(
        &self,
        secret: &Secret,
        digest: &CredentialDigest,
    ) -> Result<bool, CredentialHasherError> {
        let parsed = PasswordHash::new(digest.as_ref())
            .map_err(|err| CredentialHasherError::malformed_digest(err.to_string()))?;
        match self
            .argon2
            .verify_password(secret.expose().as_bytes(), &parsed)
        {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(CredentialHasherError::malformed_digest(err.to_string())),
        }
    }
}
