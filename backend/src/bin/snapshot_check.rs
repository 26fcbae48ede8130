//! Open the configured identity snapshot once and report its state.
//!
//! Exits non-zero when the service cannot be wired. A corrupt snapshot is
//! quarantined and reported, not treated as a failure.

use ortho_config::OrthoConfig;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use identity_backend::config::IdentitySettings;
use identity_backend::domain::ports::IdentityRepository;
use identity_backend::outbound::persistence::SnapshotLoad;
use identity_backend::startup::open_identity_service;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = IdentitySettings::load_from_iter(std::env::args_os()).map_err(|e| {
        error!(error = %e, "failed to load identity settings");
        std::io::Error::other(e.to_string())
    })?;
    let (service, load) = open_identity_service(&settings).map_err(|e| {
        error!(error = %e, "identity service startup failed");
        std::io::Error::other(e.to_string())
    })?;

    let live = service
        .repository()
        .list_all()
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?
        .len();
    match load {
        SnapshotLoad::Missing => info!(live, "no snapshot present"),
        SnapshotLoad::Loaded { records } => info!(records, live, "snapshot healthy"),
        SnapshotLoad::Recovered {
            reason,
            quarantined,
        } => warn!(
            %reason,
            quarantined = ?quarantined,
            live,
            "snapshot was corrupt and has been set aside"
        ),
    }
    Ok(())
}
