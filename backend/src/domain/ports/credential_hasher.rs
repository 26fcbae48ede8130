//! Port for turning secrets into digests and checking secrets against them.

use crate::domain::{CredentialDigest, Secret};

use super::define_port_error;

define_port_error! {
    /// Errors raised by credential hasher adapters.
    pub enum CredentialHasherError {
        /// The hash function could not produce a digest.
        Hashing { message: String } => "credential hashing failed: {message}",
        /// A stored digest could not be parsed.
        MalformedDigest { message: String } => "stored credential digest is malformed: {message}",
    }
}

/// Salted, deliberately slow one-way hashing of secrets.
///
/// Implementations embed the salt (and any cost parameters) in the digest so
/// that [`CredentialHasher::verify`] needs nothing but the digest. Hashing the
/// same secret twice yields different digests. Methods are synchronous and
/// CPU-bound; async callers should run them on a blocking pool.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    /// Produce a fresh digest for `secret`.
    fn hash(&self, secret: &Secret) -> Result<CredentialDigest, CredentialHasherError>;

    /// Return whether `secret` matches `digest`.
    ///
    /// A mismatch is `Ok(false)`; `Err` is reserved for digests that cannot be
    /// interpreted at all.
    fn verify(
        &self,
        secret: &Secret,
        digest: &CredentialDigest,
    ) -> Result<bool, CredentialHasherError>;
}
