//! Orchestration of the ledger write path and the mirror read path.
//!
//! [`ResultService`] is the only component aware of both sides. Protocol
//! summary:
//!
//! - **Writes** (add / update / verify): the ledger call is the success
//!   criterion. A ledger failure fails the operation and leaves the mirror
//!   untouched. After a committed ledger write the mirror is updated
//!   best-effort: a mirror failure is downgraded to `mirror_synced = false`
//!   on an otherwise-successful outcome, never to an operation failure.
//! - **Reads**: a student-only query lists the mirror (the ledger exposes no
//!   efficient multi-record query). A full-key query asks the ledger first
//!   and falls back to the mirror on any failure; callers receiving a
//!   mirror-sourced value must treat it as provisional.
//!
//! No mutual exclusion is taken per key. Two racing writers for the same
//! triple are serialized by the ledger contract itself (the loser observes
//! `LedgerRejected`); the mirror may transiently reflect only one of two
//! committed states.

use std::sync::Arc;

use serde::Serialize;

use result_registry_sdk::{
    CallBuilder, InspectionResult, LedgerClient, LedgerReceipt, RegistryOp,
};
use result_registry_types::{
    error::{LedgerUnavailableSnafu, NotFoundSnafu},
    require_field, GradePatch, RecordKey, Result, ResultRecord,
};

use crate::mirror::MirrorStore;

/// Where a point read was answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadSource {
    /// Authoritative, committed ledger state.
    Ledger,
    /// The local mirror; possibly stale.
    Mirror,
}

/// Outcome of [`ResultService::get_result`].
#[derive(Debug, Clone)]
pub enum ReadOutcome {
    /// Full-key read answered by the ledger.
    Ledger {
        /// Decoded inspection value (the grade).
        value: InspectionResult,
    },
    /// Full-key read answered by the mirror after a ledger failure.
    Mirror {
        /// The mirrored record.
        record: ResultRecord,
    },
    /// Student-only listing from the mirror, most-recently-updated first.
    Listing {
        /// Matching records.
        records: Vec<ResultRecord>,
    },
}

impl ReadOutcome {
    /// Source tag for point reads; `Mirror` for listings.
    #[must_use]
    pub fn source(&self) -> ReadSource {
        match self {
            Self::Ledger { .. } => ReadSource::Ledger,
            Self::Mirror { .. } | Self::Listing { .. } => ReadSource::Mirror,
        }
    }
}

/// Outcome of a successful add. `mirror_synced == false` means the record is
/// committed on-chain but possibly absent from the fast-read cache until
/// reconciled.
#[derive(Debug, Clone)]
pub struct AddOutcome {
    /// The record as written to the mirror (or as it would have been).
    pub record: ResultRecord,
    /// Receipt of the committed ledger call.
    pub receipt: LedgerReceipt,
    /// Whether the best-effort mirror insert succeeded.
    pub mirror_synced: bool,
}

/// Outcome of a successful update.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// The patched mirror record, when the mirror held one.
    pub record: Option<ResultRecord>,
    /// Receipt of the committed ledger call.
    pub receipt: LedgerReceipt,
    /// Whether the mirror now reflects the update.
    pub mirror_synced: bool,
}

/// Outcome of a successful verification.
#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    /// Receipt of the committed ledger call.
    pub receipt: LedgerReceipt,
}

/// A read query: student identifier, optionally narrowed to a full key.
#[derive(Debug, Clone)]
pub struct ResultQuery {
    /// Student identifier. Required.
    pub student_id: String,
    /// Course code; with `semester`, selects the point-lookup path.
    pub course_code: Option<String>,
    /// Semester label; with `course_code`, selects the point-lookup path.
    pub semester: Option<String>,
}

/// Orchestrates ledger writes and mirror reads. Sole writer of `tx_hash`
/// into the mirror.
pub struct ResultService {
    ledger: Arc<LedgerClient>,
    builder: CallBuilder,
    mirror: Arc<dyn MirrorStore>,
}

impl ResultService {
    /// Wires the service to its collaborators. All are constructed once at
    /// startup and shared by reference.
    pub fn new(
        ledger: Arc<LedgerClient>,
        builder: CallBuilder,
        mirror: Arc<dyn MirrorStore>,
    ) -> Self {
        Self { ledger, builder, mirror }
    }

    /// Records a new result: ledger first, then best-effort mirror insert.
    ///
    /// # Errors
    ///
    /// Fails with whatever the builder or ledger produced; the mirror is
    /// untouched on any ledger failure. A mirror failure after a committed
    /// ledger write does **not** fail the operation.
    pub async fn add_result(&self, key: &RecordKey, grade: &str) -> Result<AddOutcome> {
        let invocation = self.builder.build(RegistryOp::AddResult { key, grade })?;
        let receipt = self.ledger.execute(&invocation).await?;

        let tx_hash = receipt.digest.clone();
        let record = ResultRecord::new(key, grade, tx_hash);

        let mirror_synced = match self.mirror.insert(record.clone()).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "mirror insert failed after ledger commit");
                false
            }
        };

        tracing::info!(
            key = %key,
            digest = receipt.digest.as_deref().unwrap_or("<none>"),
            mirror_synced,
            "result added"
        );
        Ok(AddOutcome { record, receipt, mirror_synced })
    }

    /// Reads results. Path selection:
    ///
    /// 1. Student-only query: mirror listing, newest-updated first;
    ///    `NotFound` when the mirror has none.
    /// 2. Full key: ledger inspect first, mirror point lookup as fallback;
    ///    `NotFound` when both fail.
    /// 3. Partial key (course without semester or vice versa): `NotFound`.
    ///    The point-lookup path requires the full key.
    pub async fn get_result(&self, query: &ResultQuery) -> Result<ReadOutcome> {
        require_field("studentId", &query.student_id)?;

        match (query.course_code.as_deref(), query.semester.as_deref()) {
            (None, None) => self.list_for_student(&query.student_id).await,
            (Some(course_code), Some(semester)) => {
                let key = RecordKey::new(&*query.student_id, course_code, semester);
                self.point_read(&key).await
            }
            _ => NotFoundSnafu {
                message: "point lookup requires studentId, courseCode and semester",
            }
            .fail(),
        }
    }

    async fn list_for_student(&self, student_id: &str) -> Result<ReadOutcome> {
        let records = self.mirror.find_by_student(student_id).await?;
        if records.is_empty() {
            return NotFoundSnafu { message: format!("no results for student {student_id}") }
                .fail();
        }
        Ok(ReadOutcome::Listing { records })
    }

    async fn point_read(&self, key: &RecordKey) -> Result<ReadOutcome> {
        let invocation = self.builder.build(RegistryOp::GetResult { key })?;
        let ledger_failure = match self.ledger.inspect(&invocation).await {
            Ok(value) => return Ok(ReadOutcome::Ledger { value }),
            Err(err) => err,
        };

        // The primary's failure is swallowed here; it only surfaces if the
        // fallback cannot answer either.
        tracing::debug!(key = %key, error = %ledger_failure, "ledger read failed, trying mirror");
        match self.mirror.find_by_key(key).await {
            Ok(Some(record)) => Ok(ReadOutcome::Mirror { record }),
            Ok(None) => NotFoundSnafu { message: format!("no result for {key}") }.fail(),
            Err(store_failure) => {
                tracing::debug!(key = %key, error = %store_failure, "mirror fallback failed");
                NotFoundSnafu { message: format!("no reachable source holds {key}") }.fail()
            }
        }
    }

    /// Updates a grade: ledger first, then best-effort mirror patch with the
    /// new grade, a refreshed `updated_at`, and the new `tx_hash`.
    ///
    /// `mirror_synced` is false when the mirror write failed *or* when the
    /// mirror held no record for the key (nothing to patch).
    pub async fn update_result(&self, key: &RecordKey, new_grade: &str) -> Result<UpdateOutcome> {
        let invocation = self.builder.build(RegistryOp::UpdateGrade { key, new_grade })?;
        let receipt = self.ledger.execute(&invocation).await?;

        let patch = GradePatch::new(new_grade, receipt.digest.clone());
        let (record, mirror_synced) = match self.mirror.upsert(key, patch).await {
            Ok(Some(record)) => (Some(record), true),
            Ok(None) => {
                tracing::warn!(key = %key, "mirror held no record to patch after ledger update");
                (None, false)
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "mirror update failed after ledger commit");
                (None, false)
            }
        };

        tracing::info!(
            key = %key,
            digest = receipt.digest.as_deref().unwrap_or("<none>"),
            mirror_synced,
            "result updated"
        );
        Ok(UpdateOutcome { record, receipt, mirror_synced })
    }

    /// Marks a result verified on the ledger. The mirror does not project
    /// the verified flag, so no mirror write follows.
    pub async fn verify_result(&self, key: &RecordKey) -> Result<VerifyOutcome> {
        let invocation = self.builder.build(RegistryOp::VerifyResult { key })?;
        let receipt = self.ledger.execute(&invocation).await?;
        tracing::info!(
            key = %key,
            digest = receipt.digest.as_deref().unwrap_or("<none>"),
            "result verified"
        );
        Ok(VerifyOutcome { receipt })
    }

    /// Whether a result exists. Ledger-answered; on ledger failure the
    /// mirror's key presence answers instead.
    pub async fn result_exists(&self, key: &RecordKey) -> Result<bool> {
        let invocation = self.builder.build(RegistryOp::ResultExists { key })?;
        match self.ledger.inspect(&invocation).await {
            Ok(value) => value.as_bool().ok_or_else(|| {
                LedgerUnavailableSnafu { message: "non-boolean existence value" }.build()
            }),
            Err(err) => {
                tracing::debug!(key = %key, error = %err, "existence check falling back to mirror");
                Ok(self.mirror.find_by_key(key).await?.is_some())
            }
        }
    }

    /// Whether a result has been verified. Ledger-only: the mirror carries
    /// no projection of the flag, so a ledger failure propagates.
    pub async fn is_verified(&self, key: &RecordKey) -> Result<bool> {
        let invocation = self.builder.build(RegistryOp::IsVerified { key })?;
        let value = self.ledger.inspect(&invocation).await?;
        value.as_bool().ok_or_else(|| {
            LedgerUnavailableSnafu { message: "non-boolean verification value" }.build()
        })
    }

    /// The receipt index: ordered non-null transaction digests across a
    /// student's mirror records. A derived view, not separately stored.
    pub async fn list_transaction_hashes(&self, student_id: &str) -> Result<Vec<String>> {
        require_field("studentId", student_id)?;
        let records = self.mirror.find_by_student(student_id).await?;
        Ok(records.into_iter().filter_map(|r| r.tx_hash).collect())
    }
}

impl std::fmt::Debug for ResultService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultService").field("sender", &self.ledger.sender()).finish_non_exhaustive()
    }
}
