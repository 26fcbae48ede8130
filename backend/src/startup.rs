//! Wiring of the file-backed identity service.

use std::path::PathBuf;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use tracing::info;

use crate::config::IdentitySettings;
use crate::domain::IdentityService;
use crate::domain::ports::{CredentialHasherError, RandomIdentifierGenerator};
use crate::outbound::credentials::Argon2CredentialHasher;
use crate::outbound::persistence::{JsonSnapshotIdentityRepository, SnapshotError, SnapshotLoad};

/// Identity service backed by the JSON snapshot store and Argon2id.
pub type FileIdentityService = IdentityService<
    JsonSnapshotIdentityRepository,
    Argon2CredentialHasher,
    RandomIdentifierGenerator,
>;

/// Errors returned while wiring the identity service.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The snapshot path is not valid UTF-8.
    #[error("snapshot path is not valid UTF-8: {path:?}")]
    NonUtf8Path {
        /// Offending path.
        path: PathBuf,
    },
    /// The configured work factor was rejected.
    #[error("invalid credential hashing configuration: {0}")]
    HashCost(#[source] CredentialHasherError),
    /// The snapshot location could not be opened.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Build the identity service described by `settings`.
///
/// The snapshot is loaded eagerly; a corrupt snapshot is not an error here
/// but is reported through the returned [`SnapshotLoad`].
///
/// # Examples
///
/// ```rust,no_run
/// use identity_backend::config::IdentitySettings;
/// use identity_backend::startup::open_identity_service;
///
/// let settings = IdentitySettings {
///     snapshot_path: Some("data/users.json".into()),
///     ..IdentitySettings::default()
/// };
/// let (service, load) = open_identity_service(&settings)?;
/// # let _ = (service, load);
/// # Ok::<(), identity_backend::startup::StartupError>(())
/// ```
pub fn open_identity_service(
    settings: &IdentitySettings,
) -> Result<(FileIdentityService, SnapshotLoad), StartupError> {
    let path = Utf8PathBuf::from_path_buf(settings.snapshot_path())
        .map_err(|path| StartupError::NonUtf8Path { path })?;
    let hasher =
        Argon2CredentialHasher::new(settings.hash_cost()).map_err(StartupError::HashCost)?;
    let (repository, load) = JsonSnapshotIdentityRepository::open(&path)?;

    let service = IdentityService::new(
        Arc::new(repository),
        Arc::new(hasher),
        Arc::new(RandomIdentifierGenerator),
    )
    .with_max_id_attempts(settings.max_id_attempts());

    info!(path = %path, outcome = ?load, "identity service ready");
    Ok((service, load))
}
