//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: JSON snapshot repository on the local filesystem
//! - **credentials**: Argon2id credential hashing
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod credentials;
pub mod persistence;
