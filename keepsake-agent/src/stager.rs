//! Local staging of the source file.
//!
//! Copies the source to `staging_dir/backup_{date_stamp}_{basename}` before
//! any network work happens, so the upload reads a stable snapshot and the
//! remote name carries the run date. The date stamp is caller-supplied to
//! keep this component deterministic.

use std::fs::FileTimes;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use keepsake_common::error::BackupError;

/// One staged backup. Created once per run, immutable afterwards, and not
/// persisted anywhere: the staging directory is never cleaned up by this
/// agent, and nothing about an artifact survives the run.
#[derive(Debug, Clone)]
pub struct BackupArtifact {
    pub source_path: PathBuf,
    pub staged_path: PathBuf,
    /// The staged file name, which is also the name the upload carries.
    pub display_name: String,
    /// The run's date stamp, as passed in by the caller.
    pub created_at: String,
}

/// Name of the staged copy for a given source file and date stamp.
pub fn staged_file_name(source_path: &Path, date_stamp: &str) -> Option<String> {
    let basename = source_path.file_name()?.to_string_lossy();
    Some(format!("backup_{date_stamp}_{basename}"))
}

/// Copy `source_path` into `staging_dir` under its date-stamped name,
/// preserving permission bits and the modification time. Creates exactly
/// one new file; never touches the source.
pub async fn stage(
    source_path: &Path,
    staging_dir: &Path,
    date_stamp: &str,
) -> Result<BackupArtifact, BackupError> {
    let name = staged_file_name(source_path, date_stamp).ok_or_else(|| {
        BackupError::io(
            source_path,
            io::Error::new(io::ErrorKind::InvalidInput, "source path has no file name"),
        )
    })?;
    let staged_path = staging_dir.join(&name);

    // std::fs::copy carries the permission bits; timestamps are restored
    // from the source metadata afterwards.
    tokio::fs::copy(source_path, &staged_path)
        .await
        .map_err(|e| BackupError::io(source_path, e))?;

    let metadata = tokio::fs::metadata(source_path)
        .await
        .map_err(|e| BackupError::io(source_path, e))?;
    let mut times = FileTimes::new();
    if let Ok(mtime) = metadata.modified() {
        times = times.set_modified(mtime);
    }
    if let Ok(atime) = metadata.accessed() {
        times = times.set_accessed(atime);
    }
    let staged = std::fs::OpenOptions::new()
        .write(true)
        .open(&staged_path)
        .map_err(|e| BackupError::io(&staged_path, e))?;
    staged
        .set_times(times)
        .map_err(|e| BackupError::io(&staged_path, e))?;

    info!(
        source = %source_path.display(),
        staged = %staged_path.display(),
        "Backup staged"
    );
    Ok(BackupArtifact {
        source_path: source_path.to_path_buf(),
        staged_path,
        display_name: name,
        created_at: date_stamp.to_string(),
    })
}
