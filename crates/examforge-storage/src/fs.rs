//! Filesystem backends: one JSON document per test, blobs as plain files.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use examforge_core::model::Test;

use crate::data_uri::InlinePayload;
use crate::error::StorageError;
use crate::traits::{BlobStore, DocumentStore};

/// Documents stored as `{dir}/{id}.json`.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    dir: PathBuf,
}

impl FsDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, id: &str) -> Result<PathBuf, StorageError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid document id: {id:?}"),
            )
            .into());
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn get(&self, id: &str) -> Result<Option<Test>, StorageError> {
        let path = self.document_path(id)?;
        tracing::trace!(?path, "Loading document");
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, id: &str, test: &Test) -> Result<(), StorageError> {
        let path = self.document_path(id)?;
        tracing::trace!(?path, "Storing document");
        fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec_pretty(test)?;
        // Write then rename so readers never see a half-written document.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Test>, StorageError> {
        let mut tests = Vec::new();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(tests),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let bytes = fs::read(&path).await?;
            match serde_json::from_slice::<Test>(&bytes) {
                Ok(test) => tests.push(test),
                Err(e) => tracing::warn!("skipping {}: {}", path.display(), e),
            }
        }
        Ok(tests)
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        let path = self.document_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Blobs stored under `{dir}/{path}`.
///
/// URLs are `{public_base_url}/{path}` when a public base URL is configured,
/// otherwise `file://` URLs of the blob files.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    dir: PathBuf,
    url_prefix: String,
}

impl FsBlobStore {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: Option<&str>) -> Result<Self, StorageError> {
        let dir = std::path::absolute(dir.into())?;
        let url_prefix = match public_base_url {
            Some(base) => format!("{}/", base.trim_end_matches('/')),
            None => format!("file://{}/", dir.display().to_string().trim_end_matches('/')),
        };
        Ok(Self { dir, url_prefix })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a relative blob path, rejecting anything that escapes `dir`.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        (safe && !path.is_empty()).then(|| self.dir.join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, path: &str, payload: &InlinePayload) -> Result<String, StorageError> {
        let file = self.resolve(path).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid blob path: {path:?}"),
            )
        })?;
        tracing::trace!(?file, "Storing blob");
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&file, &payload.bytes).await?;
        Ok(format!("{}{path}", self.url_prefix))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let file = url
            .strip_prefix(&self.url_prefix)
            .and_then(|path| self.resolve(path))
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
        tracing::trace!(?file, "Deleting blob");
        fs::remove_file(&file).await?;
        Ok(())
    }

    fn owns(&self, url: &str) -> bool {
        url.starts_with(&self.url_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn documents_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path().join("tests"));

        assert!(store.list().await.unwrap().is_empty());
        assert!(store.get("abc").await.unwrap().is_none());

        let mut test = Test::new("Unit 1 quiz");
        test.id = Some("abc".into());
        store.put("abc", &test).await.unwrap();
        assert!(dir.path().join("tests/abc.json").exists());
        assert_eq!(store.get("abc").await.unwrap(), Some(test));
        assert_eq!(store.list().await.unwrap().len(), 1);

        store.delete("abc").await.unwrap();
        store.delete("abc").await.unwrap();
        assert!(store.get("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_skips_unparseable_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        store.put("good", &Test::new("Good")).await.unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let tests = store.list().await.unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].title, "Good");
    }

    #[tokio::test]
    async fn rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        assert!(store.put("../escape", &Test::new("x")).await.is_err());
        assert!(store.get("").await.is_err());
    }

    #[tokio::test]
    async fn blobs_with_file_urls() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), None).unwrap();
        let payload = InlinePayload::new("image/png", vec![137, 80, 78, 71]);

        let url = store.upload("tests/t/1/2/3.png", &payload).await.unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("/tests/t/1/2/3.png"));
        assert!(store.owns(&url));
        let file = dir.path().join("tests/t/1/2/3.png");
        assert_eq!(std::fs::read(&file).unwrap(), payload.bytes);

        store.delete(&url).await.unwrap();
        assert!(!file.exists());
        assert!(store.delete(&url).await.is_err());
    }

    #[tokio::test]
    async fn blobs_with_public_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), Some("https://cdn.example/assets/")).unwrap();
        let url = store
            .upload("tests/t/1/audio.wav", &InlinePayload::new("audio/wav", vec![0]))
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example/assets/tests/t/1/audio.wav");
        assert!(!store.owns("https://other.example/tests/t/1/audio.wav"));

        let err = store.delete("https://other.example/x.png").await.unwrap_err();
        assert!(matches!(err, StorageError::ForeignUrl(_)));
        assert!(store
            .upload("../outside.png", &InlinePayload::new("image/png", vec![]))
            .await
            .is_err());
    }
}
