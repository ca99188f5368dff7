//! Storage backend traits.

use async_trait::async_trait;

use examforge_core::model::Test;

use crate::data_uri::InlinePayload;
use crate::error::StorageError;

/// A keyed store of test documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, `None` if absent.
    async fn get(&self, id: &str) -> Result<Option<Test>, StorageError>;

    /// Create or replace the document stored under `id`.
    async fn put(&self, id: &str, test: &Test) -> Result<(), StorageError>;

    /// Every stored document, in no particular order.
    async fn list(&self) -> Result<Vec<Test>, StorageError>;

    /// Remove a document. Removing an absent id is not an error.
    async fn delete(&self, id: &str) -> Result<(), StorageError>;
}

/// A store of binary assets addressed by path and exposed by URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `payload` at `path`, returning its durable URL.
    async fn upload(&self, path: &str, payload: &InlinePayload) -> Result<String, StorageError>;

    /// Delete the blob behind a URL previously returned by `upload`.
    async fn delete(&self, url: &str) -> Result<(), StorageError>;

    /// Whether `url` points into this store.
    fn owns(&self, url: &str) -> bool;
}
