//! The mirror store: local cache of ledger-committed results.
//!
//! The mirror is authoritative for reads only when the ledger is unavailable
//! or for bulk listing (the ledger exposes no efficient multi-record query).
//! The persistence engine behind the trait is a document store reachable via
//! find/create/update-by-filter primitives; its internals are not this
//! crate's concern.
//!
//! No uniqueness constraint is enforced on the (student, course, semester)
//! triple at insert time. Racing callers can produce duplicate mirror rows;
//! the ledger contract is the serialization point and the mirror an
//! eventually-consistent projection.

use async_trait::async_trait;
use parking_lot::RwLock;

use result_registry_types::{
    error::StoreUnavailableSnafu, GradePatch, RecordKey, RegistryError, ResultRecord,
};

/// Document-store access to mirrored result records.
///
/// All operations are local and fail only with
/// [`StoreUnavailable`](result_registry_types::ErrorKind::StoreUnavailable).
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Inserts a record. Duplicate keys are not rejected.
    async fn insert(&self, record: ResultRecord) -> Result<(), RegistryError>;

    /// Applies a patch to the first record matching the key.
    ///
    /// Returns the updated record, or `None` if no record matches.
    async fn upsert(
        &self,
        key: &RecordKey,
        patch: GradePatch,
    ) -> Result<Option<ResultRecord>, RegistryError>;

    /// Point lookup by full key.
    async fn find_by_key(&self, key: &RecordKey) -> Result<Option<ResultRecord>, RegistryError>;

    /// All records for a student, most-recently-updated first.
    async fn find_by_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<ResultRecord>, RegistryError>;
}

/// In-memory mirror with document-store semantics.
#[derive(Debug, Default)]
pub struct InMemoryMirror {
    records: RwLock<Vec<ResultRecord>>,
}

impl InMemoryMirror {
    /// Creates an empty mirror.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if the mirror holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl MirrorStore for InMemoryMirror {
    async fn insert(&self, record: ResultRecord) -> Result<(), RegistryError> {
        self.records.write().push(record);
        Ok(())
    }

    async fn upsert(
        &self,
        key: &RecordKey,
        patch: GradePatch,
    ) -> Result<Option<ResultRecord>, RegistryError> {
        let mut records = self.records.write();
        match records.iter_mut().find(|r| r.matches(key)) {
            Some(record) => {
                record.apply(&patch);
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    async fn find_by_key(&self, key: &RecordKey) -> Result<Option<ResultRecord>, RegistryError> {
        Ok(self.records.read().iter().find(|r| r.matches(key)).cloned())
    }

    async fn find_by_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<ResultRecord>, RegistryError> {
        let mut matches: Vec<ResultRecord> = self
            .records
            .read()
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(matches)
    }
}

/// Mirror double whose storage engine is permanently unreachable. Used to
/// test the best-effort mirror-write protocol.
#[derive(Debug, Default)]
pub struct FailingMirror;

impl FailingMirror {
    fn unavailable<T>() -> Result<T, RegistryError> {
        StoreUnavailableSnafu { message: "storage engine unreachable" }.fail()
    }
}

#[async_trait]
impl MirrorStore for FailingMirror {
    async fn insert(&self, _record: ResultRecord) -> Result<(), RegistryError> {
        Self::unavailable()
    }

    async fn upsert(
        &self,
        _key: &RecordKey,
        _patch: GradePatch,
    ) -> Result<Option<ResultRecord>, RegistryError> {
        Self::unavailable()
    }

    async fn find_by_key(&self, _key: &RecordKey) -> Result<Option<ResultRecord>, RegistryError> {
        Self::unavailable()
    }

    async fn find_by_student(
        &self,
        _student_id: &str,
    ) -> Result<Vec<ResultRecord>, RegistryError> {
        Self::unavailable()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn record(student: &str, course: &str, semester: &str, grade: &str) -> ResultRecord {
        ResultRecord::new(&RecordKey::new(student, course, semester), grade, None)
    }

    #[tokio::test]
    async fn insert_then_point_lookup() {
        let mirror = InMemoryMirror::new();
        mirror.insert(record("S100", "CS201", "Fall2024", "A")).await.unwrap();

        let key = RecordKey::new("S100", "CS201", "Fall2024");
        let found = mirror.find_by_key(&key).await.unwrap().unwrap();
        assert_eq!(found.grade, "A");

        let missing = RecordKey::new("S100", "CS201", "Spring2025");
        assert!(mirror.find_by_key(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_inserts_are_not_rejected() {
        let mirror = InMemoryMirror::new();
        mirror.insert(record("S100", "CS201", "Fall2024", "A")).await.unwrap();
        mirror.insert(record("S100", "CS201", "Fall2024", "B")).await.unwrap();
        assert_eq!(mirror.len(), 2);
    }

    #[tokio::test]
    async fn upsert_patches_the_matching_record() {
        let mirror = InMemoryMirror::new();
        mirror.insert(record("S100", "CS201", "Fall2024", "B")).await.unwrap();

        let key = RecordKey::new("S100", "CS201", "Fall2024");
        let patch = GradePatch::new("A", Some("0xabc".to_owned()));
        let updated = mirror.upsert(&key, patch).await.unwrap().unwrap();
        assert_eq!(updated.grade, "A");
        assert_eq!(updated.tx_hash.as_deref(), Some("0xabc"));

        let absent = RecordKey::new("S999", "CS201", "Fall2024");
        let patch = GradePatch::new("A", None);
        assert!(mirror.upsert(&absent, patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listing_is_ordered_most_recently_updated_first() {
        let mirror = InMemoryMirror::new();

        let mut older = record("S100", "CS101", "S1", "B");
        older.updated_at = Utc::now() - Duration::hours(2);
        let mut newer = record("S100", "CS201", "S2", "A");
        newer.updated_at = Utc::now() - Duration::hours(1);

        // Insert the newer record first to rule out insertion-order effects.
        mirror.insert(newer).await.unwrap();
        mirror.insert(older).await.unwrap();
        mirror.insert(record("S200", "CS101", "S1", "C")).await.unwrap();

        let listed = mirror.find_by_student("S100").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].semester, "S2");
        assert_eq!(listed[1].semester, "S1");
    }

    #[tokio::test]
    async fn failing_mirror_reports_store_unavailable() {
        let mirror = FailingMirror;
        let err = mirror.find_by_student("S100").await.unwrap_err();
        assert_eq!(err.kind(), result_registry_types::ErrorKind::StoreUnavailable);
    }
}
