//! Local-disk persistence adapters.
//!
//! Identities are stored as a JSON snapshot written with an atomic
//! temp-file-and-rename strategy.

mod atomic_io;
mod json_identity_repository;
mod snapshot;

pub use json_identity_repository::JsonSnapshotIdentityRepository;
pub use snapshot::{SnapshotError, SnapshotLoad};
