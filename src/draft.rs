//! Draft persistence – debounced snapshots of the [`FieldRecord`] in a
//! [`KeyValueStore`], scoped by document type.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::record::FieldRecord;
use crate::session::DocumentType;
use crate::storage::KeyValueStore;

/// The stored value under `cv-builder-draft-<type>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub data: FieldRecord,
    pub timestamp: DateTime<Utc>,
    pub document_type: DocumentType,
}

/// Result of [`DraftManager::load`]. Only `Loaded` carries data; every other
/// outcome means the caller keeps its current state.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(Draft),
    Missing,
    TypeMismatch(DocumentType),
    Corrupt,
}

/// Trailing-edge debounce: each `arm` pushes the deadline out again.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<DateTime<Utc>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn arm(&mut self, now: DateTime<Utc>) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Disarm and return true when the deadline has passed.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DraftManager {
    doc_type: DocumentType,
    key: String,
    autosave: Debouncer,
    last_saved: Option<DateTime<Utc>>,
}

impl DraftManager {
    pub fn new(doc_type: DocumentType, autosave_delay: Duration) -> Self {
        Self {
            doc_type,
            key: doc_type.draft_key(),
            autosave: Debouncer::new(autosave_delay),
            last_saved: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn is_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    /// Note an edit; the save happens once edits pause for the delay.
    pub fn schedule(&mut self, now: DateTime<Utc>) {
        self.autosave.arm(now);
    }

    /// Write immediately, cancelling any pending autosave.
    pub fn save_now(
        &mut self,
        storage: &mut dyn KeyValueStore,
        record: &FieldRecord,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.autosave.cancel();
        let draft = Draft {
            data: record.clone(),
            timestamp: now,
            document_type: self.doc_type,
        };
        let json = serde_json::to_string(&draft)?;
        storage.set(&self.key, &json)?;
        self.last_saved = Some(now);
        log::info!("draft saved to '{}' ({} bytes)", self.key, json.len());
        Ok(())
    }

    /// Flush a due autosave. `None` when nothing was due.
    pub fn tick(
        &mut self,
        storage: &mut dyn KeyValueStore,
        record: &FieldRecord,
        now: DateTime<Utc>,
    ) -> Option<Result<(), StorageError>> {
        if !self.autosave.take_due(now) {
            return None;
        }
        Some(self.save_now(storage, record, now))
    }

    pub fn load(&self, storage: &dyn KeyValueStore) -> LoadOutcome {
        let raw = match storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return LoadOutcome::Missing,
            Err(e) => {
                log::error!("failed to read draft '{}': {e}", self.key);
                return LoadOutcome::Missing;
            }
        };
        match serde_json::from_str::<Draft>(&raw) {
            Ok(draft) if draft.document_type != self.doc_type => {
                log::debug!(
                    "draft under '{}' is for {}, not {}; ignoring",
                    self.key,
                    draft.document_type,
                    self.doc_type
                );
                LoadOutcome::TypeMismatch(draft.document_type)
            }
            Ok(draft) => LoadOutcome::Loaded(draft),
            Err(e) => {
                log::warn!("discarding unreadable draft '{}': {e}", self.key);
                LoadOutcome::Corrupt
            }
        }
    }

    pub fn discard(&mut self, storage: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        self.autosave.cancel();
        storage.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ListName, ScalarField};
    use crate::storage::MemoryStorage;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut storage = MemoryStorage::new();
        let mut drafts = DraftManager::new(DocumentType::Cv, Duration::seconds(2));
        let mut record = FieldRecord::default();
        record.set_scalar(ScalarField::Name, "Ada".into());
        record.push_entry(ListName::Work, None);
        drafts.save_now(&mut storage, &record, t0()).unwrap();
        match drafts.load(&storage) {
            LoadOutcome::Loaded(draft) => {
                assert_eq!(draft.data, record);
                assert_eq!(draft.timestamp, t0());
            }
            other => panic!("expected a draft, got {other:?}"),
        }
    }

    #[test]
    fn stored_json_uses_wire_names() {
        let mut storage = MemoryStorage::new();
        let mut drafts = DraftManager::new(DocumentType::Resume, Duration::seconds(2));
        drafts.save_now(&mut storage, &FieldRecord::default(), t0()).unwrap();
        let raw = storage.get("cv-builder-draft-resume").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["documentType"], "resume");
        assert!(value["timestamp"].as_str().unwrap().starts_with("2024-05-01T12:00:00"));
        assert!(value["data"]["education"].is_array());
    }

    #[test]
    fn debounce_collapses_rapid_edits() {
        let mut storage = MemoryStorage::new();
        let mut drafts = DraftManager::new(DocumentType::Cv, Duration::seconds(2));
        let record = FieldRecord::default();
        drafts.schedule(t0());
        drafts.schedule(t0() + Duration::milliseconds(1500));
        assert!(drafts.tick(&mut storage, &record, t0() + Duration::seconds(2)).is_none());
        assert!(storage.is_empty());
        let flushed = drafts.tick(&mut storage, &record, t0() + Duration::milliseconds(3500));
        assert!(matches!(flushed, Some(Ok(()))));
        assert!(drafts.tick(&mut storage, &record, t0() + Duration::seconds(10)).is_none());
    }

    #[test]
    fn mismatched_and_corrupt_drafts_are_not_loaded() {
        let mut storage = MemoryStorage::new();
        let drafts = DraftManager::new(DocumentType::Cv, Duration::seconds(2));
        storage
            .set(
                "cv-builder-draft-cv",
                r#"{"data":{},"timestamp":"2024-01-01T00:00:00Z","documentType":"resume"}"#,
            )
            .unwrap();
        assert_eq!(drafts.load(&storage), LoadOutcome::TypeMismatch(DocumentType::Resume));
        storage.set("cv-builder-draft-cv", "{not json").unwrap();
        assert_eq!(drafts.load(&storage), LoadOutcome::Corrupt);
    }

    #[test]
    fn quota_error_surfaces_from_save() {
        let mut storage = MemoryStorage::with_quota(16);
        let mut drafts = DraftManager::new(DocumentType::Cv, Duration::seconds(2));
        let err = drafts.save_now(&mut storage, &FieldRecord::default(), t0()).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert!(drafts.last_saved().is_none());
    }

    #[test]
    fn encoding_failures_surface_as_storage_errors() {
        // Tuple keys cannot be written as JSON object keys.
        let bad: std::collections::HashMap<(u8, u8), u8> = [((1, 2), 3)].into();
        let err = StorageError::from(serde_json::to_string(&bad).unwrap_err());
        assert!(matches!(err, StorageError::Encode(_)));
        assert!(err.to_string().starts_with("could not encode stored value"));
    }
}
