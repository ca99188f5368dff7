//! In-memory backends that record every call.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use examforge_core::model::Test;

use crate::data_uri::InlinePayload;
use crate::error::StorageError;
use crate::traits::{BlobStore, DocumentStore};

/// URL prefix of blobs held by [`MemoryBlobStore`].
pub const MEMORY_URL_PREFIX: &str = "memory://blobs/";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Document store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<String, Test>>,
    write_count: AtomicU32,
    fail_writes: Mutex<bool>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `put` calls.
    pub fn write_count(&self) -> u32 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Make every subsequent `put` fail.
    pub fn fail_writes(&self, fail: bool) {
        *lock(&self.fail_writes) = fail;
    }

    pub fn len(&self) -> usize {
        lock(&self.documents).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, id: &str) -> Result<Option<Test>, StorageError> {
        Ok(lock(&self.documents).get(id).cloned())
    }

    async fn put(&self, id: &str, test: &Test) -> Result<(), StorageError> {
        if *lock(&self.fail_writes) {
            return Err(std::io::Error::other("document store unavailable").into());
        }
        lock(&self.documents).insert(id.to_string(), test.clone());
        self.write_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Test>, StorageError> {
        Ok(lock(&self.documents).values().cloned().collect())
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        lock(&self.documents).remove(id);
        Ok(())
    }
}

/// Blob store backed by a `HashMap`, recording uploads and deletes.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, InlinePayload>>,
    uploads: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    fail_uploads: Mutex<bool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths uploaded so far, in call order.
    pub fn uploads(&self) -> Vec<String> {
        lock(&self.uploads).clone()
    }

    /// URLs whose deletion was attempted, in call order (including failures).
    pub fn deletes(&self) -> Vec<String> {
        lock(&self.deletes).clone()
    }

    /// Currently stored blob for `path`.
    pub fn blob(&self, path: &str) -> Option<InlinePayload> {
        lock(&self.blobs).get(path).cloned()
    }

    pub fn blob_count(&self) -> usize {
        lock(&self.blobs).len()
    }

    /// Make deletion of `url` fail.
    pub fn fail_delete_of(&self, url: impl Into<String>) {
        lock(&self.failing_deletes).insert(url.into());
    }

    /// Make every subsequent upload fail.
    pub fn fail_uploads(&self, fail: bool) {
        *lock(&self.fail_uploads) = fail;
    }

    pub fn url_for(path: &str) -> String {
        format!("{MEMORY_URL_PREFIX}{path}")
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, payload: &InlinePayload) -> Result<String, StorageError> {
        lock(&self.uploads).push(path.to_string());
        if *lock(&self.fail_uploads) {
            return Err(std::io::Error::other("blob store unavailable").into());
        }
        lock(&self.blobs).insert(path.to_string(), payload.clone());
        Ok(Self::url_for(path))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        lock(&self.deletes).push(url.to_string());
        if lock(&self.failing_deletes).contains(url) {
            return Err(std::io::Error::other(format!("cannot delete {url}")).into());
        }
        let path = url
            .strip_prefix(MEMORY_URL_PREFIX)
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
        lock(&self.blobs).remove(path);
        Ok(())
    }

    fn owns(&self, url: &str) -> bool {
        url.starts_with(MEMORY_URL_PREFIX)
    }
}
