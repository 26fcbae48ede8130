//! Port for drawing fresh identity identifiers.

use uuid::Uuid;

use crate::domain::IdentityId;

/// Source of candidate identifiers.
///
/// Uniqueness is statistical only; callers must still check the candidate
/// against the live records before using it.
#[cfg_attr(test, mockall::automock)]
pub trait IdentifierGenerator: Send + Sync {
    /// Draw a new candidate identifier.
    fn generate(&self) -> IdentityId;
}

/// Generator backed by random (version 4) UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdentifierGenerator;

impl IdentifierGenerator for RandomIdentifierGenerator {
    fn generate(&self) -> IdentityId {
        IdentityId::from_uuid(Uuid::new_v4())
    }
}
