use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trait implemented by all object-store adapters.
///
/// Each adapter handles the raw I/O for one store type (Google Drive,
/// local directory). The run pipeline is responsible for staging, content
/// typing, rotation planning, and error classification; the adapter is
/// responsible only for creating, listing, and deleting objects.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `data` as a new object named `name` inside `folder_id`,
    /// returning the store's stable identifier for the created object.
    async fn create(
        &self,
        folder_id: &str,
        name: &str,
        content_type: &str,
        data: bytes::Bytes,
    ) -> anyhow::Result<String>;

    /// List the non-folder children of `folder_id`, most recent first by
    /// creation time.
    ///
    /// This ordering is the sole tie-break rule for rotation: callers
    /// trust it as-is and apply no secondary sort. If the store returns
    /// ties, their relative order is whatever the store provided.
    async fn list(&self, folder_id: &str) -> anyhow::Result<Vec<RemoteObject>>;

    /// Delete an object by its store identifier.
    async fn delete(&self, object_id: &str) -> anyhow::Result<()>;
}

/// One object in a folder listing.
///
/// A handle into the external store, not locally owned: identifiers and
/// creation times are the store's, fetched fresh on every run and never
/// cached. Names carry no uniqueness invariant — a folder may hold several
/// objects with the same name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    pub id: String,
    pub name: String,
    pub created_time: DateTime<Utc>,
}
