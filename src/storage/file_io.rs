//! JSON persistence helpers for the entity store
//!
//! Snapshots are replaced through a sibling `.json.tmp` file and a rename, so
//! a crash mid-write leaves the previous snapshot readable.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::AuditError;

/// Load a JSON snapshot, or `T::default()` when there is none yet
pub fn read_json<T, P>(path: P) -> Result<T, AuditError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path).map_err(|e| io_error("open", path, e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AuditError::Json(format!("{} is not a valid snapshot: {}", path.display(), e)))
}

/// Replace the snapshot at `path` with `data`
///
/// Missing parent directories are created. On failure the old snapshot, if
/// any, is left in place.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), AuditError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| io_error("create directory", dir, e))?;
    }

    let staging = path.with_extension("json.tmp");
    let result = write_staged(&staging, data).and_then(|()| {
        fs::rename(&staging, path).map_err(|e| io_error("replace", path, e))
    });

    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}

fn write_staged<T: Serialize>(staging: &Path, data: &T) -> Result<(), AuditError> {
    let file = File::create(staging).map_err(|e| io_error("create", staging, e))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| AuditError::Json(format!("cannot serialize snapshot: {}", e)))?;
    writer.flush().map_err(|e| io_error("flush", staging, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| io_error("sync", staging, e))
}

fn io_error(action: &str, path: &Path, err: impl Display) -> AuditError {
    AuditError::Io(format!("cannot {} {}: {}", action, path.display(), err))
}
