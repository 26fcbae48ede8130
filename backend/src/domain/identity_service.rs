//! Identity domain service.
//!
//! This module implements the driving ports for identities on top of the
//! repository, credential hasher and identifier generator ports. It owns the
//! check-then-act sequences: every mutation runs under a single write gate so
//! two concurrent registrations cannot both pass the email check.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::ports::{
    CredentialHasher, CredentialHasherError, IdentifierGenerator, IdentityCommand, IdentityQuery,
    IdentityRepository, IdentityRepositoryError, LoginService,
};
use crate::domain::{
    CredentialDigest, EmailAddress, Error, IdentityId, IdentityRecord, IdentityUpdate,
    LoginCredentials, Registration, Secret,
};

/// Identifier draws attempted by `register` before giving up.
pub const DEFAULT_MAX_ID_ATTEMPTS: usize = 8;

/// Identity service implementing the driving ports.
pub struct IdentityService<R, H, G> {
    repository: Arc<R>,
    hasher: Arc<H>,
    generator: Arc<G>,
    write_gate: Mutex<()>,
    max_id_attempts: usize,
}

impl<R, H, G> IdentityService<R, H, G> {
    /// Create a new service over the given ports.
    pub fn new(repository: Arc<R>, hasher: Arc<H>, generator: Arc<G>) -> Self {
        Self {
            repository,
            hasher,
            generator,
            write_gate: Mutex::new(()),
            max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS,
        }
    }

    /// Override the identifier retry budget. Values below one are raised to one.
    #[must_use]
    pub fn with_max_id_attempts(mut self, attempts: usize) -> Self {
        self.max_id_attempts = attempts.max(1);
        self
    }

    /// Repository backing this service.
    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }
}

impl<R, H, G> IdentityService<R, H, G>
where
    R: IdentityRepository,
    H: CredentialHasher + 'static,
    G: IdentifierGenerator,
{
    fn map_repository_error(error: IdentityRepositoryError) -> Error {
        match error {
            IdentityRepositoryError::DuplicateId { id } => {
                Error::conflict("identity id already exists").with_details(json!({ "id": id }))
            }
            IdentityRepositoryError::DuplicateEmail { .. } => email_conflict(),
            IdentityRepositoryError::NotFound { id } => identity_not_found(&id),
            IdentityRepositoryError::Storage { message } => {
                Error::storage(format!("identity storage failed: {message}"))
            }
        }
    }

    fn map_hasher_error(error: CredentialHasherError) -> Error {
        Error::internal(error.to_string())
    }

    async fn hash_secret(&self, secret: &Secret) -> Result<CredentialDigest, Error> {
        let hasher = Arc::clone(&self.hasher);
        let secret = secret.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|err| Error::internal(format!("credential hashing task failed: {err}")))?
            .map_err(Self::map_hasher_error)
    }

    async fn verify_secret(
        &self,
        secret: &Secret,
        digest: &CredentialDigest,
    ) -> Result<bool, Error> {
        let hasher = Arc::clone(&self.hasher);
        let secret = secret.clone();
        let digest = digest.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&secret, &digest))
            .await
            .map_err(|err| Error::internal(format!("credential verification task failed: {err}")))?
            .map_err(Self::map_hasher_error)
    }

    async fn fetch(&self, id: &IdentityId) -> Result<IdentityRecord, Error> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| identity_not_found(id.as_ref()))
    }

    /// Fail with a conflict if `email` is held by a record other than `owner`.
    async fn ensure_email_available(
        &self,
        email: &EmailAddress,
        owner: Option<&IdentityId>,
    ) -> Result<(), Error> {
        let holder = self
            .repository
            .find_by_email(email)
            .await
            .map_err(Self::map_repository_error)?;
        match holder {
            Some(record) if Some(record.id()) != owner => Err(email_conflict()),
            _ => Ok(()),
        }
    }

    async fn allocate_id(&self) -> Result<IdentityId, Error> {
        for attempt in 1..=self.max_id_attempts {
            let candidate = self.generator.generate();
            let taken = self
                .repository
                .find_by_id(&candidate)
                .await
                .map_err(Self::map_repository_error)?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
            debug!(attempt, "generated identity id collided; drawing again");
        }
        Err(Error::internal(format!(
            "could not allocate a unique identity id after {} attempts",
            self.max_id_attempts
        )))
    }
}

fn email_conflict() -> Error {
    Error::conflict("email already registered").with_details(json!({ "field": "email" }))
}

fn identity_not_found(id: &str) -> Error {
    Error::not_found("identity not found").with_details(json!({ "id": id }))
}

#[async_trait]
impl<R, H, G> IdentityQuery for IdentityService<R, H, G>
where
    R: IdentityRepository + 'static,
    H: CredentialHasher + 'static,
    G: IdentifierGenerator + 'static,
{
    async fn list_users(&self) -> Result<Vec<IdentityRecord>, Error> {
        let records = self
            .repository
            .list_all()
            .await
            .map_err(Self::map_repository_error)?;
        if records.is_empty() {
            return Err(Error::empty("no identities registered"));
        }
        Ok(records)
    }

    async fn get_user(&self, id: &IdentityId) -> Result<IdentityRecord, Error> {
        self.fetch(id).await
    }
}

#[async_trait]
impl<R, H, G> IdentityCommand for IdentityService<R, H, G>
where
    R: IdentityRepository + 'static,
    H: CredentialHasher + 'static,
    G: IdentifierGenerator + 'static,
{
    async fn register(&self, registration: &Registration) -> Result<IdentityRecord, Error> {
        // Cheap rejection before paying for the hash; re-checked under the gate.
        self.ensure_email_available(registration.email(), None).await?;
        let digest = self.hash_secret(registration.secret()).await?;

        let _gate = self.write_gate.lock().await;
        self.ensure_email_available(registration.email(), None).await?;
        let id = self.allocate_id().await?;
        let record = IdentityRecord::new(
            id,
            registration.username().clone(),
            registration.email().clone(),
            digest,
        );
        self.repository
            .insert(&record)
            .await
            .map_err(Self::map_repository_error)?;

        info!(identity_id = %record.id(), "identity registered");
        Ok(record)
    }

    async fn update_user(
        &self,
        id: &IdentityId,
        update: &IdentityUpdate,
    ) -> Result<IdentityRecord, Error> {
        let digest = match update.secret() {
            Some(secret) => Some(self.hash_secret(secret).await?),
            None => None,
        };

        let _gate = self.write_gate.lock().await;
        let mut next = self.fetch(id).await?;
        if let Some(username) = update.username() {
            next = next.with_username(username.clone());
        }
        if let Some(email) = update.email() {
            self.ensure_email_available(email, Some(id)).await?;
            next = next.with_email(email.clone());
        }
        if let Some(digest) = digest {
            next = next.with_credential_digest(digest);
        }
        self.repository
            .replace(id, &next)
            .await
            .map_err(Self::map_repository_error)?;

        info!(
            identity_id = %id,
            username_changed = update.username().is_some(),
            email_changed = update.email().is_some(),
            secret_changed = update.secret().is_some(),
            "identity updated"
        );
        Ok(next)
    }

    async fn delete_user(&self, id: &IdentityId) -> Result<(), Error> {
        let _gate = self.write_gate.lock().await;
        self.repository
            .delete(id)
            .await
            .map_err(Self::map_repository_error)?;

        info!(identity_id = %id, "identity deleted");
        Ok(())
    }
}

#[async_trait]
impl<R, H, G> LoginService for IdentityService<R, H, G>
where
    R: IdentityRepository + 'static,
    H: CredentialHasher + 'static,
    G: IdentifierGenerator + 'static,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<IdentityRecord, Error> {
        let Some(record) = self
            .repository
            .find_by_email(credentials.email())
            .await
            .map_err(Self::map_repository_error)?
        else {
            debug!("authentication rejected: unknown email");
            return Err(Error::not_found("no identity exists with the email provided"));
        };

        if !self
            .verify_secret(credentials.secret(), record.credential_digest())
            .await?
        {
            debug!(identity_id = %record.id(), "authentication rejected: secret mismatch");
            return Err(Error::invalid_credentials("incorrect password"));
        }

        Ok(record)
    }
}
