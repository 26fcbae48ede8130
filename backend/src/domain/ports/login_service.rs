//! Driving port for login/authentication use-cases.
//!
//! In hexagonal terms this is a *driving* port: inbound adapters call it to
//! authenticate credentials without knowing (or importing) the backing
//! infrastructure.

use async_trait::async_trait;

use crate::domain::{Error, IdentityRecord, LoginCredentials};

/// Domain use-case port for authentication.
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the matching identity.
    ///
    /// Unknown emails yield [`ErrorCode::NotFound`](crate::domain::ErrorCode::NotFound);
    /// a wrong secret yields
    /// [`ErrorCode::InvalidCredentials`](crate::domain::ErrorCode::InvalidCredentials).
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<IdentityRecord, Error>;
}
