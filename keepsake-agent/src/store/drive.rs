//! Google Drive v3 store adapter.
//!
//! Uses reqwest with hand-built multipart/related framing for uploads so no
//! Google SDK dependency is needed. Listing requests the folder's non-folder
//! children ordered by creation time descending and follows `nextPageToken`
//! until exhausted.

use anyhow::{bail, Context};
use async_trait::async_trait;
use bytes::Bytes;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use keepsake_common::store::{ObjectStore, RemoteObject};

use crate::auth::{ServiceAccountKey, TokenProvider};

/// Scope the upload grant requests; covers only files this account created.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const DEFAULT_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

pub struct DriveStore {
    client: Client,
    tokens: TokenProvider,
    api_base: String,
    upload_base: String,
}

impl DriveStore {
    /// Build a store for one service account. `endpoint` overrides both API
    /// bases, for tests and emulators.
    pub fn new(key: ServiceAccountKey, endpoint: Option<String>) -> Self {
        let (api_base, upload_base) = match endpoint {
            Some(ep) => {
                let ep = ep.trim_end_matches('/');
                (format!("{ep}/drive/v3"), format!("{ep}/upload/drive/v3"))
            }
            None => (DEFAULT_API_BASE.to_string(), DEFAULT_UPLOAD_BASE.to_string()),
        };
        Self {
            client: Client::new(),
            tokens: TokenProvider::new(key, DRIVE_SCOPE),
            api_base,
            upload_base,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<RemoteObject>,
}

/// Drive search query for the non-folder children of a folder.
fn list_query(folder_id: &str) -> String {
    format!("'{folder_id}' in parents and mimeType != '{FOLDER_MIME_TYPE}'")
}

fn random_boundary() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("keepsake_{token}")
}

/// Frame a multipart/related upload body: a JSON metadata part followed by
/// the media part with its own content type.
fn multipart_related(metadata: &str, content_type: &str, data: &[u8], boundary: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + metadata.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[async_trait]
impl ObjectStore for DriveStore {
    async fn create(
        &self,
        folder_id: &str,
        name: &str,
        content_type: &str,
        data: Bytes,
    ) -> anyhow::Result<String> {
        let token = self.tokens.bearer_token().await?;
        let metadata = serde_json::json!({
            "name": name,
            "parents": [folder_id],
        });
        let boundary = random_boundary();
        let body = multipart_related(&metadata.to_string(), content_type, &data, &boundary);

        let url = format!("{}/files?uploadType=multipart&fields=id", self.upload_base);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .context("Drive create request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Drive create failed: HTTP {} - {}", status, body);
        }

        let created: CreatedFile = resp
            .json()
            .await
            .context("Failed to parse Drive create response")?;
        debug!(id = %created.id, name = %name, "Drive upload complete");
        Ok(created.id)
    }

    async fn list(&self, folder_id: &str) -> anyhow::Result<Vec<RemoteObject>> {
        let token = self.tokens.bearer_token().await?;
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/files?q={}&spaces=drive&orderBy={}&fields={}",
                self.api_base,
                urlencoding::encode(&list_query(folder_id)),
                urlencoding::encode("createdTime desc"),
                urlencoding::encode("nextPageToken,files(id,name,createdTime)"),
            );
            if let Some(ref t) = page_token {
                url.push_str("&pageToken=");
                url.push_str(&urlencoding::encode(t));
            }

            let resp = self
                .client
                .get(&url)
                .bearer_auth(&token)
                .send()
                .await
                .context("Drive list request failed")?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                bail!("Drive list failed: HTTP {} - {}", status, body);
            }

            let page: FileList = resp
                .json()
                .await
                .context("Failed to parse Drive list response")?;
            objects.extend(page.files);

            match page.next_page_token {
                Some(t) => page_token = Some(t),
                None => break,
            }
        }

        debug!(folder_id = %folder_id, count = objects.len(), "Drive list complete");
        Ok(objects)
    }

    async fn delete(&self, object_id: &str) -> anyhow::Result<()> {
        let token = self.tokens.bearer_token().await?;
        let url = format!(
            "{}/files/{}",
            self.api_base,
            urlencoding::encode(object_id)
        );
        let resp = self
            .client
            .delete(&url)
            .bearer_auth(&token)
            .send()
            .await
            .context("Drive delete request failed")?;

        // 404 means the object is already gone, which is what we wanted.
        if !resp.status().is_success() && resp.status().as_u16() != 404 {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Drive delete failed: HTTP {} - {}", status, body);
        }

        debug!(id = %object_id, "Drive delete complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query() {
        assert_eq!(
            list_query("folder-abc"),
            "'folder-abc' in parents and mimeType != 'application/vnd.google-apps.folder'"
        );
    }

    #[test]
    fn test_multipart_related_framing() {
        let metadata = r#"{"name":"backup_2026-08-21_db.sqlite3","parents":["folder-abc"]}"#;
        let body = multipart_related(metadata, "application/octet-stream", b"payload", "bnd123");
        let text = String::from_utf8(body).unwrap();

        assert!(text.starts_with("--bnd123\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n"));
        assert!(text.contains(metadata));
        assert!(text.contains("\r\n--bnd123\r\nContent-Type: application/octet-stream\r\n\r\npayload"));
        assert!(text.ends_with("\r\n--bnd123--\r\n"));
    }

    #[test]
    fn test_random_boundary_is_unique_enough() {
        let a = random_boundary();
        let b = random_boundary();
        assert!(a.starts_with("keepsake_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_file_list_parses_wire_shape_in_order() {
        let json = r#"{
            "nextPageToken": "tok",
            "files": [
                {"id": "new", "name": "backup_2026-08-21_db", "createdTime": "2026-08-21T03:00:00Z"},
                {"id": "old", "name": "backup_2026-08-20_db", "createdTime": "2026-08-20T03:00:00Z"}
            ]
        }"#;
        let page: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("tok"));
        let ids: Vec<_> = page.files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["new", "old"]);
    }

    #[test]
    fn test_file_list_empty_page() {
        let page: FileList = serde_json::from_str("{}").unwrap();
        assert!(page.next_page_token.is_none());
        assert!(page.files.is_empty());
    }
}
