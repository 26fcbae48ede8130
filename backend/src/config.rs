//! Identity store configuration loaded via OrthoConfig.

use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::DEFAULT_MAX_ID_ATTEMPTS;
use crate::outbound::credentials::HashCost;

const DEFAULT_SNAPSHOT_PATH: &str = "users.json";

/// Storage location and work factors for the identity store.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "IDENTITY")]
pub struct IdentitySettings {
    /// Snapshot file path. Relative paths resolve against the working directory.
    pub snapshot_path: Option<PathBuf>,
    /// Argon2 memory cost in KiB.
    pub hash_memory_kib: Option<u32>,
    /// Argon2 passes over memory.
    pub hash_iterations: Option<u32>,
    /// Argon2 lanes.
    pub hash_parallelism: Option<u32>,
    /// Identifier draws attempted per registration.
    #[ortho_config(default = 8)]
    pub max_id_attempts: usize,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            hash_memory_kib: None,
            hash_iterations: None,
            hash_parallelism: None,
            max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS,
        }
    }
}

impl IdentitySettings {
    /// Return the configured snapshot path, falling back to `users.json`.
    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH))
    }

    /// Return the work factor for new digests, filling gaps with defaults.
    pub fn hash_cost(&self) -> HashCost {
        let defaults = HashCost::default();
        HashCost {
            memory_kib: self.hash_memory_kib.unwrap_or(defaults.memory_kib),
            iterations: self.hash_iterations.unwrap_or(defaults.iterations),
            parallelism: self.hash_parallelism.unwrap_or(defaults.parallelism),
        }
    }

    /// Return the identifier retry budget, never less than one.
    pub fn max_id_attempts(&self) -> usize {
        self.max_id_attempts.max(1)
    }
}
