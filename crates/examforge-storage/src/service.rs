//! The test persistence service.
//!
//! Saving walks the test tree, uploads every inline payload to the blob
//! store, replaces it with the durable URL, recomputes stats, and writes the
//! document. Deleting removes every owned blob the document references
//! (best effort) and then the document itself.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use examforge_core::model::Test;

use crate::data_uri::InlinePayload;
use crate::error::StorageError;
use crate::paths::blob_path;
use crate::traits::{BlobStore, DocumentStore};

/// Persistence service over a document store and a blob store.
#[derive(Clone)]
pub struct TestStorage {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    prune_orphans: bool,
}

impl std::fmt::Debug for TestStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestStorage")
            .field("prune_orphans", &self.prune_orphans)
            .finish_non_exhaustive()
    }
}

impl TestStorage {
    pub fn new(documents: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            documents,
            blobs,
            prune_orphans: false,
        }
    }

    /// On update, delete owned blobs the previous version referenced but the
    /// new one no longer does.
    pub fn with_orphan_pruning(mut self, enabled: bool) -> Self {
        self.prune_orphans = enabled;
        self
    }

    /// Save a test, creating it when `existing_id` is `None`.
    ///
    /// An update replaces the stored document with `test` as a whole: fields
    /// left unset in `test` are cleared, only `created_at` is carried over.
    ///
    /// The caller's tree is never modified. Any upload or write failure
    /// aborts the save; blobs uploaded before the failure are not rolled back.
    #[instrument(skip(self, test), fields(title = %test.title))]
    pub async fn save(&self, test: &Test, existing_id: Option<&str>) -> Result<String, StorageError> {
        let id = match existing_id {
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().simple().to_string(),
        };

        let mut document = test.clone();
        let uploaded = self.externalize_assets(&id, &mut document).await?;
        document.refresh_stats();
        document.id = Some(id.clone());

        let now = Utc::now();
        let previous = match existing_id {
            Some(_) => self
                .documents
                .get(&id)
                .await
                .map_err(|e| StorageError::read(format!("test {id}"), e))?,
            None => None,
        };
        document.created_at = previous
            .as_ref()
            .and_then(|p| p.created_at)
            .or(Some(now));
        document.updated_at = Some(now);

        self.documents
            .put(&id, &document)
            .await
            .map_err(|e| StorageError::write(&id, e))?;
        info!(test_id = %id, uploaded, "test saved");

        if self.prune_orphans {
            if let Some(previous) = previous {
                let keep = self.owned_urls(&document);
                let orphans: Vec<String> = self
                    .owned_urls(&previous)
                    .into_iter()
                    .filter(|url| !keep.contains(url))
                    .collect();
                self.delete_blobs(&orphans).await;
            }
        }

        Ok(id)
    }

    /// All stored tests, newest `created_at` first.
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Test>, StorageError> {
        let mut tests = self
            .documents
            .list()
            .await
            .map_err(|e| StorageError::read("tests", e))?;
        tests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tests)
    }

    /// A single test, `None` if no test has this id.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Test>, StorageError> {
        self.documents
            .get(id)
            .await
            .map_err(|e| StorageError::read(format!("test {id}"), e))
    }

    /// Like [`get_by_id`](Self::get_by_id) but absence is an error.
    pub async fn require(&self, id: &str) -> Result<Test, StorageError> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    /// Delete a test and, best effort, every owned blob it references.
    ///
    /// Deleting an absent test succeeds.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), StorageError> {
        match self.get_by_id(id).await? {
            Some(test) => {
                let urls: Vec<String> = self.owned_urls(&test).into_iter().collect();
                let deleted = self.delete_blobs(&urls).await;
                info!(test_id = %id, deleted, attempted = urls.len(), "deleted test assets");
            }
            None => debug!(test_id = %id, "test already absent"),
        }

        self.documents
            .delete(id)
            .await
            .map_err(|e| StorageError::delete(id, e))
    }

    /// Upload every inline payload in `test` and replace it with its URL.
    /// Returns the number of uploads.
    async fn externalize_assets(&self, test_id: &str, test: &mut Test) -> Result<usize, StorageError> {
        let mut uploaded = 0;
        for slot in test.asset_slots_mut() {
            let Some(asset) = slot.value.as_ref().filter(|a| a.is_inline()) else {
                continue;
            };
            let payload = InlinePayload::decode(asset)?;
            let path = blob_path(test_id, slot.location, &payload);
            debug!(%path, bytes = payload.bytes.len(), "uploading inline payload");
            let url = self
                .blobs
                .upload(&path, &payload)
                .await
                .map_err(|e| StorageError::upload(&path, e))?;
            *slot.value = Some(url.into());
            uploaded += 1;
        }
        Ok(uploaded)
    }

    /// Durable URLs in `test` that belong to the blob store.
    fn owned_urls(&self, test: &Test) -> HashSet<String> {
        test.assets()
            .into_iter()
            .map(|(_, asset)| asset.as_str())
            .filter(|url| self.blobs.owns(url))
            .map(str::to_string)
            .collect()
    }

    /// Delete every URL, logging failures. Returns how many succeeded.
    async fn delete_blobs(&self, urls: &[String]) -> usize {
        let mut deleted = 0;
        for url in urls {
            match self.blobs.delete(url).await {
                Ok(()) => deleted += 1,
                Err(e) => warn!(%url, error = %e, "blob deletion failed, continuing"),
            }
        }
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examforge_core::model::*;

    use crate::memory::{MemoryBlobStore, MemoryDocumentStore};

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";
    const WAV: &str = "data:audio/wav;base64,UklGRg==";

    fn storage() -> (TestStorage, Arc<MemoryDocumentStore>, Arc<MemoryBlobStore>) {
        let docs = Arc::new(MemoryDocumentStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let storage = TestStorage::new(docs.clone(), blobs.clone());
        (storage, docs, blobs)
    }

    /// A test with listening audio, an image MCQ, a speaking image and a
    /// fill-in-word slot image, all inline.
    fn test_with_assets() -> Test {
        let mut test = Test::new("Assets");
        test.sections.get_mut(SectionKind::Listening).parts.push(Part {
            id: 10,
            title: "Part 1: Listen".into(),
            passage: None,
            audio_url: Some(WAV.into()),
            questions: vec![Question {
                id: 11,
                text: "Which one?".into(),
                is_example: false,
                body: QuestionBody::MultipleChoiceImage(Choices {
                    options: vec![
                        ChoiceOption {
                            image_url: Some(PNG.into()),
                            is_correct: true,
                            ..ChoiceOption::new(1, "A")
                        },
                        ChoiceOption {
                            image_url: Some("https://elsewhere.example/b.png".into()),
                            ..ChoiceOption::new(2, "B")
                        },
                        ChoiceOption::new(3, "C"),
                    ],
                }),
            }],
        });
        let mut words = PictureWords::seeded(31);
        words.images[0].image_url = Some("data:image/jpeg;base64,/9j/".into());
        test.sections.get_mut(SectionKind::Writing).parts.push(Part {
            id: 20,
            title: "Part 1: Look and write".into(),
            passage: None,
            audio_url: None,
            questions: vec![Question {
                id: 30,
                text: String::new(),
                is_example: false,
                body: QuestionBody::WritingFillInWord(words),
            }],
        });
        test.sections.get_mut(SectionKind::Speaking).parts.push(Part {
            id: 40,
            title: "Part 1: Talk".into(),
            passage: None,
            audio_url: None,
            questions: vec![Question {
                id: 41,
                text: "What is she doing?".into(),
                is_example: false,
                body: QuestionBody::SpeakingQa(SpokenAnswer {
                    image_url: Some(PNG.into()),
                    reference_answer: "She is reading.".into(),
                }),
            }],
        });
        test
    }

    #[tokio::test]
    async fn save_externalizes_inline_payloads() {
        let (storage, _, blobs) = storage();
        let input = test_with_assets();
        let id = storage.save(&input, None).await.unwrap();

        let mut uploads = blobs.uploads();
        uploads.sort();
        assert_eq!(
            uploads,
            vec![
                format!("tests/{id}/10/11/1.png"),
                format!("tests/{id}/10/audio.wav"),
                format!("tests/{id}/20/30/31.jpeg"),
                format!("tests/{id}/40/41/image.png"),
            ]
        );

        // Caller state is untouched.
        assert_eq!(input, test_with_assets());

        let stored = storage.require(&id).await.unwrap();
        assert!(stored.assets().iter().all(|(_, a)| !a.is_inline()));
        assert_eq!(stored.id.as_deref(), Some(id.as_str()));
        assert_eq!(
            blobs.blob(&format!("tests/{id}/10/audio.wav")).unwrap().bytes,
            b"RIFF"
        );
    }

    #[tokio::test]
    async fn resave_performs_no_uploads() {
        let (storage, _, blobs) = storage();
        let id = storage.save(&test_with_assets(), None).await.unwrap();
        let saved = storage.require(&id).await.unwrap();
        let uploads = blobs.uploads().len();

        let again = storage.save(&saved, Some(&id)).await.unwrap();
        assert_eq!(again, id);
        assert_eq!(blobs.uploads().len(), uploads);
    }

    #[tokio::test]
    async fn roundtrip_preserves_structure_and_timestamps() {
        let (storage, _, _) = storage();
        let mut test = Test::new("Round trip");
        test.sections.get_mut(SectionKind::Reading).parts.push(Part {
            id: 1,
            title: "Part 1: Read".into(),
            passage: Some("Hi, I'm Nam.".into()),
            audio_url: None,
            questions: vec![Question {
                id: 2,
                text: "Nam is ten.".into(),
                is_example: false,
                body: QuestionBody::TrueFalse(Verdict { is_true: true }),
            }],
        });
        // Caller-supplied stats are replaced by the computed ones.
        test.stats.total_score = 42.0;

        let id = storage.save(&test, None).await.unwrap();
        let stored = storage.require(&id).await.unwrap();
        assert_eq!(stored.sections, test.sections);
        assert_eq!(stored.stats.total_score, 0.25);
        let created = stored.created_at.unwrap();
        assert_eq!(stored.updated_at, Some(created));

        let mut edited = stored.clone();
        edited.title = "Renamed".into();
        storage.save(&edited, Some(&id)).await.unwrap();
        let updated = storage.require(&id).await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.created_at, Some(created));
        assert!(updated.updated_at.unwrap() >= created);
    }

    #[tokio::test]
    async fn update_replaces_the_whole_document() {
        let (storage, _, _) = storage();
        let mut test = Test::new("Unit 1");
        test.curriculum_id = Some("i-learn-smart-start-5".into());
        test.knowledge_unit_id = Some("unit1".into());
        let id = storage.save(&test, None).await.unwrap();

        let mut edited = storage.require(&id).await.unwrap();
        edited.curriculum_id = None;
        edited.knowledge_unit_id = None;
        storage.save(&edited, Some(&id)).await.unwrap();

        let stored = storage.require(&id).await.unwrap();
        assert_eq!(stored.curriculum_id, None);
        assert_eq!(stored.knowledge_unit_id, None);
        assert_eq!(stored.title, "Unit 1");
    }

    #[tokio::test]
    async fn update_of_unknown_id_creates_it() {
        let (storage, docs, _) = storage();
        let id = storage
            .save(&Test::new("Fresh"), Some("chosen-id"))
            .await
            .unwrap();
        assert_eq!(id, "chosen-id");
        assert!(storage.require("chosen-id").await.unwrap().created_at.is_some());
        assert_eq!(docs.write_count(), 1);
    }

    #[tokio::test]
    async fn get_all_is_newest_first() {
        let (storage, _, _) = storage();
        let first = storage.save(&Test::new("first"), None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = storage.save(&Test::new("second"), None).await.unwrap();

        let all = storage.get_all().await.unwrap();
        let ids: Vec<_> = all.iter().filter_map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn delete_removes_document_and_owned_blobs() {
        let (storage, _, blobs) = storage();
        let id = storage.save(&test_with_assets(), None).await.unwrap();
        let stored = storage.require(&id).await.unwrap();
        let owned = stored
            .assets()
            .iter()
            .filter(|(_, a)| a.as_str().starts_with("memory://"))
            .count();

        storage.delete(&id).await.unwrap();
        assert!(storage.get_by_id(&id).await.unwrap().is_none());
        assert_eq!(blobs.deletes().len(), owned);
        assert_eq!(blobs.blob_count(), 0);
        // The foreign URL is left alone.
        assert!(!blobs
            .deletes()
            .iter()
            .any(|u| u.contains("elsewhere.example")));
    }

    #[tokio::test]
    async fn delete_continues_past_blob_failures() {
        let (storage, _, blobs) = storage();
        let id = storage.save(&test_with_assets(), None).await.unwrap();
        let audio_url = MemoryBlobStore::url_for(&format!("tests/{id}/10/audio.wav"));
        blobs.fail_delete_of(audio_url);

        storage.delete(&id).await.unwrap();
        assert!(storage.get_by_id(&id).await.unwrap().is_none());
        assert_eq!(blobs.deletes().len(), 4);
        assert_eq!(blobs.blob_count(), 1);
    }

    #[tokio::test]
    async fn delete_of_absent_test_succeeds() {
        let (storage, _, blobs) = storage();
        storage.delete("missing").await.unwrap();
        assert!(blobs.deletes().is_empty());
    }

    #[tokio::test]
    async fn upload_failure_aborts_save() {
        let (storage, docs, blobs) = storage();
        blobs.fail_uploads(true);
        let err = storage.save(&test_with_assets(), None).await.unwrap_err();
        assert!(matches!(err, StorageError::Upload { .. }));
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn write_failure_is_wrapped() {
        let (storage, docs, _) = storage();
        docs.fail_writes(true);
        let err = storage.save(&Test::new("x"), None).await.unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
    }

    #[tokio::test]
    async fn invalid_inline_payload_aborts_save() {
        let (storage, docs, _) = storage();
        let mut test = test_with_assets();
        test.sections.get_mut(SectionKind::Listening).parts[0].audio_url =
            Some("data:audio/wav,not-base64".into());
        let err = storage.save(&test, None).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidPayload(_)));
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn orphans_are_kept_unless_pruning_is_enabled() {
        for prune in [false, true] {
            let docs = Arc::new(MemoryDocumentStore::new());
            let blobs = Arc::new(MemoryBlobStore::new());
            let storage =
                TestStorage::new(docs.clone(), blobs.clone()).with_orphan_pruning(prune);

            let id = storage.save(&test_with_assets(), None).await.unwrap();
            let mut edited = storage.require(&id).await.unwrap();
            edited.sections.get_mut(SectionKind::Speaking).parts.clear();
            storage.save(&edited, Some(&id)).await.unwrap();

            let speaking_url =
                MemoryBlobStore::url_for(&format!("tests/{id}/40/41/image.png"));
            assert_eq!(blobs.deletes().contains(&speaking_url), prune);
            assert_eq!(blobs.deletes().len(), usize::from(prune));
        }
    }
}
