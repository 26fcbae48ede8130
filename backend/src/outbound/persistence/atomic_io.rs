//! Atomic file replacement.
//!
//! Contents go to a hidden temporary file beside the target, are flushed to
//! stable storage and then renamed over the target. Readers observe either the
//! previous file or the new one, never a partial write.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use cap_std::fs::{Dir, OpenOptions};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `file_name` inside `dir` with `contents`.
///
/// The temporary file is removed if any step before the rename fails. The
/// directory sync after the rename is best effort.
///
/// # Errors
///
/// Returns the underlying I/O error from creating, writing, syncing or
/// renaming the temporary file.
pub(crate) fn write_atomic(dir: &Dir, file_name: &str, contents: &str) -> io::Result<()> {
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    let tmp_name = format!(
        ".{}.tmp.{}.{}.{}",
        file_name,
        std::process::id(),
        suffix,
        counter
    );

    write_temp_file(dir, &tmp_name, contents)?;
    if let Err(err) = rename_over(dir, &tmp_name, file_name) {
        discard(dir, &tmp_name);
        return Err(err);
    }
    sync_directory(dir);
    Ok(())
}

fn write_temp_file(dir: &Dir, tmp_name: &str, contents: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(tmp_name, &options)?;

    let written = file
        .write_all(contents.as_bytes())
        .and_then(|()| file.sync_all());
    if let Err(err) = written {
        drop(file);
        discard(dir, tmp_name);
        return Err(err);
    }
    Ok(())
}

#[cfg(windows)]
fn rename_over(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    // Windows rename fails if the target exists.
    match dir.remove_file(target_name) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    dir.rename(tmp_name, dir, target_name)
}

#[cfg(not(windows))]
fn rename_over(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    dir.rename(tmp_name, dir, target_name)
}

fn discard(dir: &Dir, tmp_name: &str) {
    if dir.remove_file(tmp_name).is_err() {
        // Nothing more to do; the stray file is hidden and uniquely named.
    }
}

fn sync_directory(dir: &Dir) {
    if dir.open(".").and_then(|handle| handle.sync_all()).is_err() {
        // Some platforms cannot fsync a directory handle.
    }
}
