use std::path::PathBuf;

use anyhow::bail;

use keepsake_common::retention::RetentionPolicy;

const DEFAULT_STAGING_DIR: &str = "/tmp";

/// Immutable run configuration, built once at process start from the
/// environment and passed by reference into the components. Nothing else
/// in the crate reads ambient state.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub source_path: PathBuf,
    pub staging_dir: PathBuf,
    pub folder_id: String,
    pub retain_count: i64,
    pub store: StoreConfig,
}

#[derive(Debug, Clone)]
pub enum StoreConfig {
    Drive {
        credentials_file: PathBuf,
        endpoint: Option<String>,
    },
    Directory {
        root: PathBuf,
    },
}

impl BackupConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build and validate a configuration from a key lookup. The lookup is
    /// injectable so tests never touch the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let source_path = PathBuf::from(required(&lookup, "KEEPSAKE_SOURCE_PATH")?);
        let folder_id = required(&lookup, "KEEPSAKE_FOLDER_ID")?;

        let staging_dir = optional(&lookup, "KEEPSAKE_STAGING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR));

        let retain_count = match optional(&lookup, "KEEPSAKE_RETAIN_COUNT") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(n) => n,
                Err(_) => bail!("KEEPSAKE_RETAIN_COUNT must be an integer, got {:?}", raw),
            },
            None => RetentionPolicy::DEFAULT_MAX_COUNT,
        };
        if retain_count <= 0 {
            bail!("KEEPSAKE_RETAIN_COUNT must be positive, got {}", retain_count);
        }

        let store_kind = optional(&lookup, "KEEPSAKE_STORE").unwrap_or_else(|| "drive".to_string());
        let store = match store_kind.as_str() {
            "drive" => StoreConfig::Drive {
                credentials_file: PathBuf::from(required(&lookup, "KEEPSAKE_CREDENTIALS_FILE")?),
                endpoint: optional(&lookup, "KEEPSAKE_DRIVE_ENDPOINT")
                    .map(|e| e.trim_end_matches('/').to_string()),
            },
            "directory" => StoreConfig::Directory {
                root: PathBuf::from(required(&lookup, "KEEPSAKE_STORE_ROOT")?),
            },
            other => bail!("KEEPSAKE_STORE must be 'drive' or 'directory', got {:?}", other),
        };

        Ok(Self {
            source_path,
            staging_dir,
            folder_id,
            retain_count,
            store,
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    match lookup(key) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => bail!("{} must be set", key),
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<BackupConfig> {
        let map = env(pairs);
        BackupConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_minimal_drive_config_with_defaults() {
        let config = load(&[
            ("KEEPSAKE_SOURCE_PATH", "/data/db.sqlite3"),
            ("KEEPSAKE_FOLDER_ID", "folder-abc"),
            ("KEEPSAKE_CREDENTIALS_FILE", "/etc/keepsake/sa.json"),
        ])
        .unwrap();

        assert_eq!(config.source_path, PathBuf::from("/data/db.sqlite3"));
        assert_eq!(config.folder_id, "folder-abc");
        assert_eq!(config.staging_dir, PathBuf::from("/tmp"));
        assert_eq!(config.retain_count, 4);
        match config.store {
            StoreConfig::Drive {
                credentials_file,
                endpoint,
            } => {
                assert_eq!(credentials_file, PathBuf::from("/etc/keepsake/sa.json"));
                assert!(endpoint.is_none());
            }
            other => panic!("expected drive store, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_source_path_rejected() {
        let err = load(&[
            ("KEEPSAKE_FOLDER_ID", "folder-abc"),
            ("KEEPSAKE_CREDENTIALS_FILE", "/etc/keepsake/sa.json"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("KEEPSAKE_SOURCE_PATH"));
    }

    #[test]
    fn test_empty_required_value_rejected() {
        let err = load(&[
            ("KEEPSAKE_SOURCE_PATH", ""),
            ("KEEPSAKE_FOLDER_ID", "folder-abc"),
            ("KEEPSAKE_CREDENTIALS_FILE", "/etc/keepsake/sa.json"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("KEEPSAKE_SOURCE_PATH"));
    }

    #[test]
    fn test_zero_retain_count_rejected() {
        let err = load(&[
            ("KEEPSAKE_SOURCE_PATH", "/data/db.sqlite3"),
            ("KEEPSAKE_FOLDER_ID", "folder-abc"),
            ("KEEPSAKE_CREDENTIALS_FILE", "/etc/keepsake/sa.json"),
            ("KEEPSAKE_RETAIN_COUNT", "0"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("positive"));
    }

    #[test]
    fn test_negative_retain_count_rejected() {
        let err = load(&[
            ("KEEPSAKE_SOURCE_PATH", "/data/db.sqlite3"),
            ("KEEPSAKE_FOLDER_ID", "folder-abc"),
            ("KEEPSAKE_CREDENTIALS_FILE", "/etc/keepsake/sa.json"),
            ("KEEPSAKE_RETAIN_COUNT", "-2"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("positive"));
    }

    #[test]
    fn test_non_integer_retain_count_rejected() {
        let err = load(&[
            ("KEEPSAKE_SOURCE_PATH", "/data/db.sqlite3"),
            ("KEEPSAKE_FOLDER_ID", "folder-abc"),
            ("KEEPSAKE_CREDENTIALS_FILE", "/etc/keepsake/sa.json"),
            ("KEEPSAKE_RETAIN_COUNT", "four"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn test_directory_store_requires_root() {
        let err = load(&[
            ("KEEPSAKE_SOURCE_PATH", "/data/db.sqlite3"),
            ("KEEPSAKE_FOLDER_ID", "backups"),
            ("KEEPSAKE_STORE", "directory"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("KEEPSAKE_STORE_ROOT"));
    }

    #[test]
    fn test_directory_store_config() {
        let config = load(&[
            ("KEEPSAKE_SOURCE_PATH", "/data/db.sqlite3"),
            ("KEEPSAKE_FOLDER_ID", "backups"),
            ("KEEPSAKE_STORE", "directory"),
            ("KEEPSAKE_STORE_ROOT", "/var/lib/keepsake"),
        ])
        .unwrap();
        match config.store {
            StoreConfig::Directory { root } => {
                assert_eq!(root, PathBuf::from("/var/lib/keepsake"));
            }
            other => panic!("expected directory store, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_store_rejected() {
        let err = load(&[
            ("KEEPSAKE_SOURCE_PATH", "/data/db.sqlite3"),
            ("KEEPSAKE_FOLDER_ID", "folder-abc"),
            ("KEEPSAKE_STORE", "s3"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("KEEPSAKE_STORE"));
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let config = load(&[
            ("KEEPSAKE_SOURCE_PATH", "/data/db.sqlite3"),
            ("KEEPSAKE_FOLDER_ID", "folder-abc"),
            ("KEEPSAKE_CREDENTIALS_FILE", "/etc/keepsake/sa.json"),
            ("KEEPSAKE_DRIVE_ENDPOINT", "http://localhost:9090/"),
        ])
        .unwrap();
        match config.store {
            StoreConfig::Drive { endpoint, .. } => {
                assert_eq!(endpoint.as_deref(), Some("http://localhost:9090"));
            }
            other => panic!("expected drive store, got {:?}", other),
        }
    }
}
