//! JSON snapshot-backed `IdentityRepository` implementation.
//!
//! All live records are held in memory and the whole set is rewritten to a
//! single JSON file after every mutation. Mutations are staged on a copy of
//! the map and only become visible once the snapshot write succeeds, so a
//! failed write leaves both the file and the in-memory view unchanged.

use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use camino::Utf8Path;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::ports::{IdentityRepository, IdentityRepositoryError};
use crate::domain::{EmailAddress, IdentityId, IdentityRecord};

use super::snapshot::{RecordMap, SnapshotError, SnapshotFile, SnapshotLoad, decode};

/// Identity repository persisted as a JSON snapshot on local disk.
#[derive(Debug)]
pub struct JsonSnapshotIdentityRepository {
    snapshot: Arc<SnapshotFile>,
    records: RwLock<RecordMap>,
}

impl JsonSnapshotIdentityRepository {
    /// Open the snapshot at `path`, creating its parent directory if needed.
    ///
    /// A missing file yields an empty store. A file that cannot be read or
    /// parsed, or whose contents violate id or email uniqueness, is moved
    /// aside as `.<name>.corrupt.<uuid>` and the store starts empty.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the path has no file name or its parent
    /// directory cannot be created or opened.
    pub fn open(path: &Utf8Path) -> Result<(Self, SnapshotLoad), SnapshotError> {
        let snapshot = SnapshotFile::open(path)?;
        let (records, load) = Self::restore(&snapshot);
        let repository = Self {
            snapshot: Arc::new(snapshot),
            records: RwLock::new(records),
        };
        Ok((repository, load))
    }

    /// Location of the backing snapshot file.
    pub fn path(&self) -> &Utf8Path {
        self.snapshot.path()
    }

    fn restore(snapshot: &SnapshotFile) -> (RecordMap, SnapshotLoad) {
        let path = snapshot.path();
        let contents = match snapshot.read() {
            Ok(Some(contents)) => contents,
            Ok(None) => {
                info!(path = %path, "no identity snapshot found; starting empty");
                return (RecordMap::new(), SnapshotLoad::Missing);
            }
            Err(err) => {
                let reason = format!("snapshot could not be read: {err}");
                warn!(path = %path, %reason, "identity snapshot unreadable; starting empty");
                return (
                    RecordMap::new(),
                    SnapshotLoad::Recovered {
                        reason,
                        quarantined: None,
                    },
                );
            }
        };

        match decode(&contents) {
            Ok(records) => {
                info!(path = %path, records = records.len(), "identity snapshot loaded");
                let load = SnapshotLoad::Loaded {
                    records: records.len(),
                };
                (records, load)
            }
            Err(reason) => {
                let quarantined = match snapshot.quarantine() {
                    Ok(moved) => Some(moved),
                    Err(err) => {
                        warn!(path = %path, error = %err, "failed to move corrupt snapshot aside");
                        None
                    }
                };
                warn!(
                    path = %path,
                    %reason,
                    quarantined = ?quarantined,
                    "identity snapshot corrupt; starting empty"
                );
                (
                    RecordMap::new(),
                    SnapshotLoad::Recovered {
                        reason,
                        quarantined,
                    },
                )
            }
        }
    }

    /// Apply `mutate` to a copy of the live map, persist it, then publish it.
    ///
    /// The write runs on the blocking pool while the exclusive guard is held,
    /// so readers wait for it but runtime workers do not. If this future is
    /// dropped mid-write the file may be ahead of memory until the next open.
    async fn commit<F>(&self, mutate: F) -> Result<(), IdentityRepositoryError>
    where
        F: FnOnce(&mut RecordMap) -> Result<(), IdentityRepositoryError> + Send,
    {
        let mut live = self.records.write().await;
        let mut staged = live.clone();
        mutate(&mut staged)?;

        let snapshot = Arc::clone(&self.snapshot);
        let staged = tokio::task::spawn_blocking(move || snapshot.write(&staged).map(|()| staged))
            .await
            .map_err(|err| {
                IdentityRepositoryError::storage(format!("snapshot write task failed: {err}"))
            })?
            .map_err(|err| IdentityRepositoryError::storage(err.to_string()))?;

        debug!(path = %self.path(), records = staged.len(), "identity snapshot written");
        *live = staged;
        Ok(())
    }
}

fn email_taken_by_other(records: &RecordMap, email: &EmailAddress, owner: &IdentityId) -> bool {
    records
        .values()
        .any(|record| record.email() == email && record.id() != owner)
}

#[async_trait]
impl IdentityRepository for JsonSnapshotIdentityRepository {
    async fn list_all(&self) -> Result<Vec<IdentityRecord>, IdentityRepositoryError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn find_by_id(
        &self,
        id: &IdentityId,
    ) -> Result<Option<IdentityRecord>, IdentityRepositoryError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<IdentityRecord>, IdentityRepositoryError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|record| record.email() == email)
            .cloned())
    }

    async fn insert(&self, record: &IdentityRecord) -> Result<(), IdentityRepositoryError> {
        self.commit(|records| {
            if email_taken_by_other(records, record.email(), record.id()) {
                return Err(IdentityRepositoryError::duplicate_email(
                    record.email().as_ref(),
                ));
            }
            match records.entry(record.id().clone()) {
                Entry::Occupied(_) => Err(IdentityRepositoryError::duplicate_id(
                    record.id().as_ref(),
                )),
                Entry::Vacant(slot) => {
                    slot.insert(record.clone());
                    Ok(())
                }
            }
        })
        .await
    }

    async fn replace(
        &self,
        id: &IdentityId,
        record: &IdentityRecord,
    ) -> Result<(), IdentityRepositoryError> {
        self.commit(|records| {
            if !records.contains_key(id) {
                return Err(IdentityRepositoryError::not_found(id.as_ref()));
            }
            if email_taken_by_other(records, record.email(), id) {
                return Err(IdentityRepositoryError::duplicate_email(
                    record.email().as_ref(),
                ));
            }
            records.insert(id.clone(), record.clone());
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &IdentityId) -> Result<(), IdentityRepositoryError> {
        self.commit(|records| {
            records
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| IdentityRepositoryError::not_found(id.as_ref()))
        })
        .await
    }
}

#[cfg(test)]
mod tests;
