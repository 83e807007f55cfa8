//! Record persistence
//!
//! The core owns one read-modify-write per attempt; anything that must land
//! together (results plus the status flip) goes through a single `update`
//! call so implementations can make it one transaction.

use crate::error::{Result, ResumeAnalyzerError};
use crate::pipeline::record::ProcessingRecord;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

pub trait RecordStore: Send + Sync {
    fn insert(&self, record: ProcessingRecord) -> Result<()>;

    fn get(&self, id: Uuid) -> Result<ProcessingRecord>;

    /// Atomic read-modify-write. The closure sees the current record and
    /// mutates it in place; the store persists the whole record or nothing.
    /// A closure error leaves the stored record untouched.
    fn update(
        &self,
        id: Uuid,
        apply: &mut dyn FnMut(&mut ProcessingRecord) -> Result<()>,
    ) -> Result<ProcessingRecord>;
}

/// Reference in-memory store, used by the CLI and tests. Real deployments
/// implement `RecordStore` against their database.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Uuid, ProcessingRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("record store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, record: ProcessingRecord) -> Result<()> {
        let mut records = self.records.lock().expect("record store poisoned");
        records.insert(record.id, record);
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<ProcessingRecord> {
        let records = self.records.lock().expect("record store poisoned");
        records
            .get(&id)
            .cloned()
            .ok_or_else(|| ResumeAnalyzerError::RecordNotFound(id.to_string()))
    }

    fn update(
        &self,
        id: Uuid,
        apply: &mut dyn FnMut(&mut ProcessingRecord) -> Result<()>,
    ) -> Result<ProcessingRecord> {
        let mut records = self.records.lock().expect("record store poisoned");
        let current = records
            .get(&id)
            .ok_or_else(|| ResumeAnalyzerError::RecordNotFound(id.to_string()))?;

        // Apply against a copy; commit only on success.
        let mut updated = current.clone();
        apply(&mut updated)?;
        records.insert(id, updated.clone());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::record::Status;

    #[test]
    fn test_insert_and_get() {
        let store = MemoryStore::new();
        let record = ProcessingRecord::new("user-1", "resume.pdf");
        let id = record.id;
        store.insert(record).unwrap();
        assert_eq!(store.get(id).unwrap().owner, "user-1");
    }

    #[test]
    fn test_get_unknown_record() {
        let store = MemoryStore::new();
        let result = store.get(Uuid::new_v4());
        assert!(matches!(result, Err(ResumeAnalyzerError::RecordNotFound(_))));
    }

    #[test]
    fn test_update_commits_on_success() {
        let store = MemoryStore::new();
        let record = ProcessingRecord::new("user-1", "resume.pdf");
        let id = record.id;
        store.insert(record).unwrap();

        let updated = store
            .update(id, &mut |r| r.transition(Status::Processing))
            .unwrap();
        assert_eq!(updated.status, Status::Processing);
        assert_eq!(store.get(id).unwrap().status, Status::Processing);
    }

    #[test]
    fn test_failed_update_leaves_record_consistent() {
        let store = MemoryStore::new();
        let record = ProcessingRecord::new("user-1", "resume.pdf");
        let id = record.id;
        store.insert(record).unwrap();

        // Illegal transition: closure fails, stored record is untouched.
        let result = store.update(id, &mut |r| {
            r.title = "clobbered".to_string();
            r.transition(Status::Processed)
        });
        assert!(result.is_err());

        let stored = store.get(id).unwrap();
        assert_eq!(stored.status, Status::Uploaded);
        assert_eq!(stored.title, "resume.pdf");
    }
}
