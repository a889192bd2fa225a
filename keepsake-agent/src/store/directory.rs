//! Local directory store adapter.
//!
//! Maps a folder id to a directory under a configured root, for development
//! runs and integration-style tests. Object ids are root-relative paths.
//! Uses atomic write (temp file → fsync → rename) to prevent partial
//! objects. Unlike Drive, creating an object under an existing name
//! overwrites it.

use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

use keepsake_common::store::{ObjectStore, RemoteObject};

pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn folder_path(&self, folder_id: &str) -> PathBuf {
        // Prevent path traversal
        let folder_id = folder_id.trim_start_matches('/').replace("..", "");
        self.root.join(folder_id)
    }

    fn object_path(&self, object_id: &str) -> PathBuf {
        let object_id = object_id.trim_start_matches('/').replace("..", "");
        self.root.join(object_id)
    }
}

fn created_time(metadata: &std::fs::Metadata) -> DateTime<Utc> {
    // Not every filesystem records a birth time; fall back to mtime.
    let time = metadata
        .created()
        .or_else(|_| metadata.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH);
    DateTime::<Utc>::from(time)
}

#[async_trait]
impl ObjectStore for DirectoryStore {
    async fn create(
        &self,
        folder_id: &str,
        name: &str,
        _content_type: &str,
        data: Bytes,
    ) -> anyhow::Result<String> {
        let folder = self.folder_path(folder_id);
        tokio::fs::create_dir_all(&folder)
            .await
            .context("Failed to create folder directory")?;

        let dest = folder.join(name);
        let tmp_path = dest.with_extension("tmp");
        tokio::fs::write(&tmp_path, &data)
            .await
            .context("Failed to write temp file")?;

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .open(&tmp_path)
            .await
            .context("Failed to open temp file for fsync")?;
        file.sync_all().await.context("fsync failed")?;
        drop(file);

        tokio::fs::rename(&tmp_path, &dest)
            .await
            .context("Atomic rename failed")?;

        let object_id = dest
            .strip_prefix(&self.root)
            .unwrap_or(&dest)
            .to_string_lossy()
            .to_string();
        debug!(id = %object_id, "Directory store create complete");
        Ok(object_id)
    }

    async fn list(&self, folder_id: &str) -> anyhow::Result<Vec<RemoteObject>> {
        let folder = self.folder_path(folder_id);
        let mut objects = Vec::new();
        if !folder.exists() {
            return Ok(objects);
        }

        let mut entries = tokio::fs::read_dir(&folder)
            .await
            .context("Failed to read folder directory")?;

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let path = entry.path();
            let id = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .to_string_lossy()
                .to_string();
            let name = entry.file_name().to_string_lossy().to_string();
            objects.push(RemoteObject {
                id,
                name,
                created_time: created_time(&metadata),
            });
        }

        // Newest first, matching the store contract. The sort is stable so
        // ties keep their directory order.
        objects.sort_by(|a, b| b.created_time.cmp(&a.created_time));
        Ok(objects)
    }

    async fn delete(&self, object_id: &str) -> anyhow::Result<()> {
        let path = self.object_path(object_id);
        if path.exists() {
            tokio::fs::remove_file(&path)
                .await
                .context("Failed to delete object file")?;
        }
        debug!(id = %object_id, "Directory store delete complete");
        Ok(())
    }
}
