//! Port abstraction for identity persistence adapters and their errors.
//!
//! The repository owns the authoritative set of live identity records. It is
//! responsible for the uniqueness of `id` and `email`: a check-then-insert in
//! the caller is never sufficient on its own, so `insert` and `replace` must
//! re-check atomically with the mutation they perform.

use async_trait::async_trait;

use crate::domain::{EmailAddress, IdentityId, IdentityRecord};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity repository adapters.
    pub enum IdentityRepositoryError {
        /// A live record already uses this identifier.
        DuplicateId { id: String } => "identity id already exists: {id}",
        /// A different live record already uses this email.
        DuplicateEmail { email: String } => "email already registered: {email}",
        /// No live record has this identifier.
        NotFound { id: String } => "identity not found: {id}",
        /// The durable snapshot could not be written.
        Storage { message: String } => "identity storage failed: {message}",
    }
}

/// Port for identity storage and retrieval.
///
/// Mutations are durable when they return `Ok`: adapters persist before
/// acknowledging, and leave their state untouched when persistence fails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Return every live record, in no particular order.
    async fn list_all(&self) -> Result<Vec<IdentityRecord>, IdentityRepositoryError>;

    /// Fetch a record by identifier.
    async fn find_by_id(
        &self,
        id: &IdentityId,
    ) -> Result<Option<IdentityRecord>, IdentityRepositoryError>;

    /// Fetch a record by exact, case-sensitive email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<IdentityRecord>, IdentityRepositoryError>;

    /// Add a new record.
    ///
    /// Fails with [`IdentityRepositoryError::DuplicateId`] or
    /// [`IdentityRepositoryError::DuplicateEmail`] on collision.
    async fn insert(&self, record: &IdentityRecord) -> Result<(), IdentityRepositoryError>;

    /// Replace the record stored under `id`.
    ///
    /// Fails with [`IdentityRepositoryError::NotFound`] if `id` is absent and
    /// with [`IdentityRepositoryError::DuplicateEmail`] if the replacement's
    /// email belongs to another record.
    async fn replace(
        &self,
        id: &IdentityId,
        record: &IdentityRecord,
    ) -> Result<(), IdentityRepositoryError>;

    /// Remove the record stored under `id`.
    ///
    /// Fails with [`IdentityRepositoryError::NotFound`] if `id` is absent.
    async fn delete(&self, id: &IdentityId) -> Result<(), IdentityRepositoryError>;
}
