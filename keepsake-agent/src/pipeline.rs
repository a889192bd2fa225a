//! The upload-and-rotate pipeline.
//!
//! One run walks UPLOAD → LIST → ROTATE against a single remote folder.
//! Upload and list failures abort the run: rotation never executes without
//! a fresh successful backup and an authoritative current listing.
//! Rotation itself is best-effort per object; a failed delete is recorded
//! and skipped, never fatal.

use std::path::PathBuf;

use tracing::{info, warn};

use keepsake_common::error::{BackupError, DeleteFailure};
use keepsake_common::retention::RetentionPolicy;
use keepsake_common::store::ObjectStore;

use crate::stager::BackupArtifact;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Outcome of one completed run, logged by the binary at exit. Per-object
/// delete failures live here rather than in the error path; they do not
/// affect the process exit status.
#[derive(Debug)]
pub struct RunReport {
    pub staged_path: PathBuf,
    pub remote_id: String,
    pub kept: usize,
    pub pruned: Vec<String>,
    pub failures: Vec<DeleteFailure>,
}

/// Upload the staged artifact into `folder_id`, then prune the folder down
/// to the policy's retention count using the store's own newest-first
/// listing.
pub async fn upload_and_rotate(
    store: &dyn ObjectStore,
    artifact: &BackupArtifact,
    folder_id: &str,
    policy: RetentionPolicy,
) -> Result<RunReport, BackupError> {
    let staged_path = &artifact.staged_path;
    let content_type = mime_guess::from_path(staged_path)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

    let data = tokio::fs::read(staged_path)
        .await
        .map_err(|e| BackupError::io(staged_path, e))?;

    info!(
        name = %artifact.display_name,
        size = data.len(),
        content_type = %content_type,
        "Uploading backup"
    );
    let remote_id = store
        .create(folder_id, &artifact.display_name, &content_type, data.into())
        .await
        .map_err(|source| BackupError::Upload {
            folder_id: folder_id.to_string(),
            source,
        })?;
    info!(remote_id = %remote_id, "Upload complete");

    let listing = store
        .list(folder_id)
        .await
        .map_err(|source| BackupError::List {
            folder_id: folder_id.to_string(),
            source,
        })?;
    info!(count = listing.len(), "Folder listed");

    let plan = policy.plan(listing);
    let kept = plan.keep.len();
    let mut pruned = Vec::new();
    let mut failures = Vec::new();

    for object in plan.prune {
        match store.delete(&object.id).await {
            Ok(()) => {
                info!(id = %object.id, name = %object.name, "Deleted old backup");
                pruned.push(object.id);
            }
            Err(error) => {
                warn!(
                    id = %object.id,
                    name = %object.name,
                    error = %error,
                    "Failed to delete old backup, skipping"
                );
                failures.push(DeleteFailure { object, error });
            }
        }
    }

    Ok(RunReport {
        staged_path: staged_path.clone(),
        remote_id,
        kept,
        pruned,
        failures,
    })
}
