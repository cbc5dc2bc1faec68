//! Export history – the most recent exports, newest first, kept under the
//! `exportHistory` storage key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::pipeline::{ExportFormat, PaperSize, Quality};
use crate::storage::KeyValueStore;

pub const HISTORY_KEY: &str = "exportHistory";
/// Most exports ever kept; also the default.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    #[serde(rename = "type")]
    pub format: ExportFormat,
    pub file_name: String,
    pub quality: Quality,
    pub paper_size: PaperSize,
    pub timestamp: DateTime<Utc>,
    /// Human-readable form of `timestamp`.
    pub date: String,
}

impl HistoryRecord {
    pub fn new(
        format: ExportFormat,
        file_name: impl Into<String>,
        quality: Quality,
        paper_size: PaperSize,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            format,
            file_name: file_name.into(),
            quality,
            paper_size,
            timestamp,
            date: timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportHistory {
    records: Vec<HistoryRecord>,
    limit: usize,
}

impl ExportHistory {
    /// `limit` is clamped to `1..=DEFAULT_HISTORY_LIMIT`.
    pub fn new(limit: usize) -> Self {
        Self {
            records: Vec::new(),
            limit: limit.clamp(1, DEFAULT_HISTORY_LIMIT),
        }
    }

    /// Read the stored history; unreadable data yields an empty history.
    pub fn load(storage: &dyn KeyValueStore, limit: usize) -> Self {
        let mut history = Self::new(limit);
        match storage.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<HistoryRecord>>(&raw) {
                Ok(mut records) => {
                    records.truncate(history.limit);
                    history.records = records;
                }
                Err(e) => log::warn!("ignoring unreadable export history: {e}"),
            },
            Ok(None) => {}
            Err(e) => log::warn!("could not read export history: {e}"),
        }
        history
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Prepend a record, drop the oldest beyond the limit, and persist.
    pub fn push(&mut self, storage: &mut dyn KeyValueStore, record: HistoryRecord) -> Result<(), StorageError> {
        self.records.insert(0, record);
        self.records.truncate(self.limit);
        self.persist(storage)
    }

    pub fn clear(&mut self, storage: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        self.records.clear();
        self.persist(storage)
    }

    fn persist(&self, storage: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.records)?;
        storage.set(HISTORY_KEY, &json)
    }
}

impl Default for ExportHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::{Duration, TimeZone};

    fn record(i: i64) -> HistoryRecord {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(i);
        HistoryRecord::new(ExportFormat::Pdf, format!("CV-{i}.pdf"), Quality::Standard, PaperSize::A4, t)
    }

    #[test]
    fn newest_first_and_capped() {
        let mut storage = MemoryStorage::new();
        let mut history = ExportHistory::default();
        for i in 0..12 {
            history.push(&mut storage, record(i)).unwrap();
        }
        assert_eq!(history.len(), 10);
        assert_eq!(history.records()[0].file_name, "CV-11.pdf");

        let reloaded = ExportHistory::load(&storage, 10);
        assert_eq!(reloaded.records(), history.records());
    }

    #[test]
    fn configured_limit_never_exceeds_ten() {
        let mut storage = MemoryStorage::new();
        let mut history = ExportHistory::new(50);
        for i in 0..15 {
            history.push(&mut storage, record(i)).unwrap();
        }
        assert_eq!(history.len(), 10);
        assert_eq!(ExportHistory::load(&storage, 50).len(), 10);

        let mut small = ExportHistory::new(3);
        for i in 0..5 {
            small.push(&mut storage, record(i)).unwrap();
        }
        assert_eq!(small.len(), 3);
    }

    #[test]
    fn wire_format() {
        let json = serde_json::to_value(record(0)).unwrap();
        assert_eq!(json["type"], "PDF");
        assert_eq!(json["fileName"], "CV-0.pdf");
        assert_eq!(json["paperSize"], "a4");
        assert_eq!(json["quality"], "standard");
        assert_eq!(json["date"], "2024-01-01 00:00:00 UTC");
    }

    #[test]
    fn clear_and_corrupt_history() {
        let mut storage = MemoryStorage::new();
        let mut history = ExportHistory::default();
        history.push(&mut storage, record(1)).unwrap();
        history.clear(&mut storage).unwrap();
        assert!(ExportHistory::load(&storage, 10).is_empty());

        storage.set(HISTORY_KEY, "oops").unwrap();
        assert!(ExportHistory::load(&storage, 10).is_empty());
    }
}
