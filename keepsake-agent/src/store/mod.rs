pub mod directory;
pub mod drive;

use keepsake_common::store::ObjectStore;

use crate::auth::ServiceAccountKey;
use crate::config::StoreConfig;
use self::directory::DirectoryStore;
use self::drive::DriveStore;

/// Construct the object store named by the configuration.
pub fn from_config(store: &StoreConfig) -> anyhow::Result<Box<dyn ObjectStore>> {
    match store {
        StoreConfig::Drive {
            credentials_file,
            endpoint,
        } => {
            let key = ServiceAccountKey::load(credentials_file)?;
            Ok(Box::new(DriveStore::new(key, endpoint.clone())))
        }
        StoreConfig::Directory { root } => Ok(Box::new(DirectoryStore::new(root))),
    }
}
