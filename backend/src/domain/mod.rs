//! Domain primitives, ports and services.
//!
//! Purpose: define the identity record model, the validated inputs that reach
//! the service, the ports that isolate storage and hashing, and the identity
//! service that enforces uniqueness and credential rules.
//!
//! Public surface:
//! - Error / ErrorCode: transport agnostic failure taxonomy.
//! - IdentityRecord and its value types: the stored identity.
//! - Registration / LoginCredentials / IdentityUpdate: validated inputs.
//! - IdentityService: implementation of the driving ports in [`ports`].

pub mod credentials;
pub mod error;
pub mod identity;
pub mod identity_service;
pub mod ports;

pub use self::credentials::{IdentityUpdate, LoginCredentials, Registration, Secret};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::{
    CredentialDigest, EmailAddress, IdentityId, IdentityRecord, IdentityValidationError,
    PublicIdentity, Username,
};
pub use self::identity_service::{DEFAULT_MAX_ID_ATTEMPTS, IdentityService};

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use identity_backend::domain::{DomainResult, Error};
///
/// fn lookup() -> DomainResult<()> {
///     Err(Error::not_found("missing"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;

impl From<IdentityValidationError> for Error {
    fn from(value: IdentityValidationError) -> Self {
        Self::invalid_request(value.to_string())
    }
}
