use std::path::PathBuf;

use crate::store::RemoteObject;

/// Fatal errors a backup run can end with, one variant per pipeline phase.
///
/// The variants mirror the run's hard-fail phases: configuration is
/// rejected before any I/O, staging and upload failures abort before any
/// remote object is touched, and a listing failure aborts before any
/// deletion is issued. Per-object deletion failures during rotation are
/// deliberately not represented here — they are recovered locally and
/// surface as [`DeleteFailure`] records in the run report instead.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Missing or invalid configuration, reported before any work begins.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Local filesystem failure while staging the source file or reading
    /// the staged copy back for upload.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote create-object call failed. Rotation must not run after
    /// this: pruning without a fresh successful backup could delete the
    /// only remaining good copies.
    #[error("upload to folder {folder_id} failed: {source}")]
    Upload {
        folder_id: String,
        #[source]
        source: anyhow::Error,
    },

    /// The remote listing failed after a successful upload. Rotation must
    /// not run against an assumed or stale view of the folder; the old
    /// objects stay until a later run can list them.
    #[error("listing folder {folder_id} failed: {source}")]
    List {
        folder_id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl BackupError {
    /// Wrap a filesystem error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// One rotation delete that failed and was skipped.
///
/// Collected into the run report rather than propagated: a stuck or
/// permission-denied object must not block cleanup of the others, and the
/// backup itself already succeeded by the time rotation runs.
#[derive(Debug)]
pub struct DeleteFailure {
    pub object: RemoteObject,
    pub error: anyhow::Error,
}
