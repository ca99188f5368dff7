//! Storage configuration.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::fs::{FsBlobStore, FsDocumentStore};
use crate::service::TestStorage;

/// The `[storage]` table of `examforge.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON document per test.
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,
    /// Directory holding uploaded blobs.
    #[serde(default = "default_blobs_dir")]
    pub blobs_dir: PathBuf,
    /// Base URL under which `blobs_dir` is served. Blob URLs are `file://`
    /// URLs when unset.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Delete blobs that an update stopped referencing.
    #[serde(default)]
    pub prune_orphans_on_save: bool,
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("./examforge-data/tests")
}

fn default_blobs_dir() -> PathBuf {
    PathBuf::from("./examforge-data/blobs")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            blobs_dir: default_blobs_dir(),
            public_base_url: None,
            prune_orphans_on_save: false,
        }
    }
}

impl StorageConfig {
    /// Open the filesystem-backed persistence service described by this config.
    pub fn open(&self) -> Result<TestStorage, StorageError> {
        let documents = FsDocumentStore::new(&self.documents_dir);
        let blobs = FsBlobStore::new(&self.blobs_dir, self.public_base_url.as_deref())?;
        Ok(TestStorage::new(Arc::new(documents), Arc::new(blobs))
            .with_orphan_pruning(self.prune_orphans_on_save))
    }
}
