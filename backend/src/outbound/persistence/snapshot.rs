//! On-disk identity snapshot: location, codec and recovery.
//!
//! The snapshot is a single pretty-printed JSON object mapping each identity
//! id to its record. Records are emitted in id order so successive writes of
//! the same state are byte-identical.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{IdentityId, IdentityRecord};

use super::atomic_io::write_atomic;

/// Live records keyed by identifier.
pub(crate) type RecordMap = HashMap<IdentityId, IdentityRecord>;

/// Errors raised while locating, reading or writing the snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The configured path does not end in a file name.
    #[error("snapshot path must name a file: '{path}'")]
    InvalidPath { path: Utf8PathBuf },
    /// A filesystem operation failed.
    #[error("snapshot I/O failed at '{path}': {message}")]
    Io { path: Utf8PathBuf, message: String },
    /// The in-memory records could not be serialised.
    #[error("failed to encode identity snapshot: {message}")]
    Encode { message: String },
}

/// Outcome of reading the snapshot at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotLoad {
    /// No snapshot file existed; the store starts empty.
    Missing,
    /// The snapshot was read successfully.
    Loaded {
        /// Number of records restored.
        records: usize,
    },
    /// The snapshot was unreadable or inconsistent; the store starts empty.
    Recovered {
        /// Why the snapshot was rejected.
        reason: String,
        /// Where the rejected file was moved, if it could be moved.
        quarantined: Option<Utf8PathBuf>,
    },
}

/// Handle on the snapshot file inside its capability-scoped directory.
#[derive(Debug)]
pub(crate) struct SnapshotFile {
    dir: Dir,
    file_name: String,
    path: Utf8PathBuf,
}

impl SnapshotFile {
    /// Resolve `path`, creating its parent directory when absent.
    pub(crate) fn open(path: &Utf8Path) -> Result<Self, SnapshotError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| SnapshotError::InvalidPath {
                path: path.to_path_buf(),
            })?
            .to_owned();
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        let io_error = |err: io::Error| SnapshotError::Io {
            path: parent.to_path_buf(),
            message: err.to_string(),
        };
        Dir::create_ambient_dir_all(parent, ambient_authority()).map_err(io_error)?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(io_error)?;

        Ok(Self {
            dir,
            file_name,
            path: path.to_path_buf(),
        })
    }

    pub(crate) fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Read the raw snapshot bytes. A missing file is `Ok(None)`.
    ///
    /// Encoding is left to [`decode`] so that undecodable bytes count as
    /// corruption rather than as an I/O failure.
    pub(crate) fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match self.dir.read(&self.file_name) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Serialise `records` and atomically replace the snapshot with them.
    pub(crate) fn write(&self, records: &RecordMap) -> Result<(), SnapshotError> {
        let contents = encode(records)?;
        write_atomic(&self.dir, &self.file_name, &contents).map_err(|err| SnapshotError::Io {
            path: self.path.clone(),
            message: err.to_string(),
        })
    }

    /// Move a rejected snapshot aside so the next write cannot destroy it.
    pub(crate) fn quarantine(&self) -> Result<Utf8PathBuf, SnapshotError> {
        let target = format!(".{}.corrupt.{}", self.file_name, Uuid::new_v4().simple());
        self.dir
            .rename(&self.file_name, &self.dir, &target)
            .map_err(|err| SnapshotError::Io {
                path: self.path.clone(),
                message: err.to_string(),
            })?;
        Ok(self.path.with_file_name(target))
    }
}

/// Render records as the canonical snapshot document.
pub(crate) fn encode(records: &RecordMap) -> Result<String, SnapshotError> {
    let ordered: BTreeMap<&str, &IdentityRecord> = records
        .iter()
        .map(|(id, record)| (id.as_ref(), record))
        .collect();
    let mut contents =
        serde_json::to_string_pretty(&ordered).map_err(|err| SnapshotError::Encode {
            message: err.to_string(),
        })?;
    contents.push('\n');
    Ok(contents)
}

/// Parse a snapshot document, rejecting any that breaks the store's rules.
///
/// Every key must equal the id of the record it holds and no two records may
/// share an email. The error is a human-readable reason.
pub(crate) fn decode(contents: &[u8]) -> Result<RecordMap, String> {
    let parsed: BTreeMap<String, IdentityRecord> =
        serde_json::from_slice(contents).map_err(|err| err.to_string())?;

    let mut emails = HashSet::with_capacity(parsed.len());
    let mut records = RecordMap::with_capacity(parsed.len());
    for (key, record) in parsed {
        if key != record.id().as_ref() {
            return Err(format!(
                "record keyed '{key}' carries id '{}'",
                record.id()
            ));
        }
        if !emails.insert(record.email().clone()) {
            return Err(format!(
                "email '{}' is held by more than one record",
                record.email()
            ));
        }
        records.insert(record.id().clone(), record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ALICE_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
    const BOB_ID: &str = "9b2d7c1e-8a4f-4e7b-9c3d-1f2e3a4b5c6d";

    fn record(id: &str, email: &str) -> IdentityRecord {
        IdentityRecord::try_from_strings(id, "someone", email, "$argon2id$stub")
            .expect("valid record")
    }

    fn map_of(records: &[IdentityRecord]) -> RecordMap {
        records
            .iter()
            .map(|record| (record.id().clone(), record.clone()))
            .collect()
    }

    #[rstest]
    fn encode_orders_records_by_id_and_ends_with_newline() {
        let records = map_of(&[record(BOB_ID, "b@x.com"), record(ALICE_ID, "a@x.com")]);

        let text = encode(&records).expect("encode");

        let alice_at = text.find(ALICE_ID).expect("alice present");
        let bob_at = text.find(BOB_ID).expect("bob present");
        assert!(alice_at < bob_at);
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\"credentialDigest\""));
    }

    #[rstest]
    fn decode_restores_what_encode_wrote() {
        let records = map_of(&[record(ALICE_ID, "a@x.com"), record(BOB_ID, "b@x.com")]);
        let text = encode(&records).expect("encode");

        let decoded = decode(text.as_bytes()).expect("decode");

        assert_eq!(decoded, records);
    }

    #[rstest]
    fn non_uuid_keys_are_accepted() {
        let text = br#"{"user-123": {"id": "user-123", "username": "a", "email": "a@x.com", "credentialDigest": "d"}}"#;

        let decoded = decode(text).expect("opaque ids decode");

        assert!(decoded.contains_key(&IdentityId::new("user-123").expect("id")));
    }

    #[rstest]
    fn empty_object_decodes_to_no_records() {
        assert!(decode(b"{}").expect("decode").is_empty());
    }

    #[rstest]
    #[case::not_json(b"not json at all".as_slice())]
    #[case::array(b"[]".as_slice())]
    #[case::truncated(b"{\"3fa85f64-5717-4562-b3fc-2c963f66afa6\": {\"id\": ".as_slice())]
    #[case::blank_username(
        br#"{"3fa85f64-5717-4562-b3fc-2c963f66afa6": {"id": "3fa85f64-5717-4562-b3fc-2c963f66afa6", "username": " ", "email": "a@x.com", "credentialDigest": "d"}}"#.as_slice()
    )]
    #[case::invalid_utf8(b"{\"k\": \"\xff\xfe\"}".as_slice())]
    fn malformed_documents_are_rejected(#[case] bytes: &[u8]) {
        assert!(decode(bytes).is_err());
    }

    #[rstest]
    fn key_must_match_record_id() {
        let text = format!(
            r#"{{"{BOB_ID}": {{"id": "{ALICE_ID}", "username": "a", "email": "a@x.com", "credentialDigest": "d"}}}}"#
        );

        let reason = decode(text.as_bytes()).expect_err("mismatched key");

        assert!(reason.contains(BOB_ID));
    }

    #[rstest]
    fn shared_email_is_rejected() {
        let records = map_of(&[record(ALICE_ID, "same@x.com"), record(BOB_ID, "same@x.com")]);
        let text = encode(&records).expect("encode");

        let reason = decode(text.as_bytes()).expect_err("duplicate email");

        assert!(reason.contains("same@x.com"));
    }

    #[rstest]
    fn open_rejects_paths_without_a_file_name() {
        let error = SnapshotFile::open(Utf8Path::new("/")).expect_err("no file name");
        assert!(matches!(error, SnapshotError::InvalidPath { .. }));
    }

    #[rstest]
    fn open_creates_missing_parent_and_quarantine_moves_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp dir");
        let path = root.join("nested/dir/users.json");

        let snapshot = SnapshotFile::open(&path).expect("open snapshot");
        assert!(snapshot.read().expect("read").is_none());

        snapshot.write(&RecordMap::new()).expect("write");
        assert_eq!(
            snapshot.read().expect("read").as_deref(),
            Some(b"{}\n".as_slice())
        );

        let moved = snapshot.quarantine().expect("quarantine");
        assert!(snapshot.read().expect("read").is_none());
        assert!(moved.as_str().contains(".users.json.corrupt."));
        assert!(moved.as_std_path().exists());
    }
}
