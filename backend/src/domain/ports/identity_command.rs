//! Driving port for identity mutations.

use async_trait::async_trait;

use crate::domain::{Error, IdentityId, IdentityRecord, IdentityUpdate, Registration};

/// Domain use-case port for creating, changing and removing identities.
#[async_trait]
pub trait IdentityCommand: Send + Sync {
    /// Create a new identity.
    ///
    /// Fails with [`ErrorCode::Conflict`](crate::domain::ErrorCode::Conflict)
    /// when the email is already registered.
    async fn register(&self, registration: &Registration) -> Result<IdentityRecord, Error>;

    /// Overlay the supplied fields onto the stored identity.
    async fn update_user(
        &self,
        id: &IdentityId,
        update: &IdentityUpdate,
    ) -> Result<IdentityRecord, Error>;

    /// Remove the identity stored under `id`.
    async fn delete_user(&self, id: &IdentityId) -> Result<(), Error>;
}
