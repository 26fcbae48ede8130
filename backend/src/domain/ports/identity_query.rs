//! Driving port for identity lookups.
//!
//! Inbound adapters (the HTTP layer) use this port to read identities without
//! importing outbound persistence concerns. Returned records still carry their
//! credential digest; callers strip it (see
//! [`IdentityRecord::public_view`](crate::domain::IdentityRecord::public_view))
//! before exposing records externally.

use async_trait::async_trait;

use crate::domain::{Error, IdentityId, IdentityRecord};

/// Domain use-case port for reading identities.
#[async_trait]
pub trait IdentityQuery: Send + Sync {
    /// Return every live identity.
    ///
    /// An empty store is reported as [`ErrorCode::Empty`](crate::domain::ErrorCode::Empty)
    /// rather than an empty list.
    async fn list_users(&self) -> Result<Vec<IdentityRecord>, Error>;

    /// Return the identity stored under `id`.
    async fn get_user(&self, id: &IdentityId) -> Result<IdentityRecord, Error>;
}
