//! Domain entities for academic results.
//!
//! A result is identified by the (student, course, semester) triple. The
//! mirror does not enforce a hard uniqueness constraint on the triple at
//! creation time; the ledger contract is the serialization point.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Logical identity of a result record: the (student, course, semester)
/// triple. Unique in steady state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordKey {
    /// Student identifier, non-empty.
    pub student_id: String,
    /// Course code, non-empty.
    pub course_code: String,
    /// Semester label, non-empty.
    pub semester: String,
}

impl RecordKey {
    /// Creates a key from its components.
    pub fn new(
        student_id: impl Into<String>,
        course_code: impl Into<String>,
        semester: impl Into<String>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            course_code: course_code.into(),
            semester: semester.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.student_id, self.course_code, self.semester)
    }
}

/// A mirrored academic result.
///
/// The ledger is the system of record for grade values once a write
/// succeeds; this record is a derived projection that may be stale. The
/// orchestrating service is the sole writer of `tx_hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    /// Student identifier.
    pub student_id: String,
    /// Course code.
    pub course_code: String,
    /// Grade value.
    pub grade: String,
    /// Semester label.
    pub semester: String,
    /// Set once at creation.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
    /// Transaction digest of the most recent successful ledger write
    /// affecting this record; `None` until a ledger write succeeds or when
    /// a receipt carried no digest.
    pub tx_hash: Option<String>,
}

impl ResultRecord {
    /// Creates a fresh record with both timestamps set to now.
    pub fn new(key: &RecordKey, grade: impl Into<String>, tx_hash: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            student_id: key.student_id.clone(),
            course_code: key.course_code.clone(),
            grade: grade.into(),
            semester: key.semester.clone(),
            created_at: now,
            updated_at: now,
            tx_hash,
        }
    }

    /// Returns the logical key of this record.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&*self.student_id, &*self.course_code, &*self.semester)
    }

    /// Returns true if this record matches the given key.
    #[must_use]
    pub fn matches(&self, key: &RecordKey) -> bool {
        self.student_id == key.student_id
            && self.course_code == key.course_code
            && self.semester == key.semester
    }

    /// Applies a grade patch, refreshing `updated_at` and `tx_hash`.
    pub fn apply(&mut self, patch: &GradePatch) {
        self.grade = patch.grade.clone();
        self.updated_at = patch.updated_at;
        self.tx_hash = patch.tx_hash.clone();
    }
}

/// Mutation applied to a mirrored record after a successful ledger update.
#[derive(Debug, Clone, PartialEq)]
pub struct GradePatch {
    /// New grade value.
    pub grade: String,
    /// Digest of the ledger write that produced this mutation.
    pub tx_hash: Option<String>,
    /// New `updated_at` timestamp.
    pub updated_at: DateTime<Utc>,
}

impl GradePatch {
    /// Creates a patch stamped with the current time.
    pub fn new(grade: impl Into<String>, tx_hash: Option<String>) -> Self {
        Self { grade: grade.into(), tx_hash, updated_at: Utc::now() }
    }
}
