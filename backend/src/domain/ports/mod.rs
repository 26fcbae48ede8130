//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod credential_hasher;
mod identifier_generator;
mod identity_command;
mod identity_query;
mod identity_repository;
mod login_service;

#[cfg(test)]
pub use credential_hasher::MockCredentialHasher;
pub use credential_hasher::{CredentialHasher, CredentialHasherError};
#[cfg(test)]
pub use identifier_generator::MockIdentifierGenerator;
pub use identifier_generator::{IdentifierGenerator, RandomIdentifierGenerator};
pub use identity_command::IdentityCommand;
pub use identity_query::IdentityQuery;
#[cfg(test)]
pub use identity_repository::MockIdentityRepository;
pub use identity_repository::{IdentityRepository, IdentityRepositoryError};
pub use login_service::LoginService;
