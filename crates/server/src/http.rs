//! HTTP surface of the registry service.
//!
//! Thin translation layer: deserialize the request, call into
//! [`ResultService`], map the outcome (or error taxonomy) to a status code
//! and a JSON body. No orchestration decisions are made here.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use result_registry_types::{ErrorKind, RecordKey, RegistryError, ResultRecord};

use crate::service::{ReadOutcome, ReadSource, ResultQuery, ResultService};

/// Builds the service router.
pub fn router(service: Arc<ResultService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/results", post(add_result).get(get_result).put(update_result))
        .route("/api/v1/results/verify", post(verify_result))
        .route("/api/v1/results/exists", get(result_exists))
        .route("/api/v1/results/verified", get(is_verified))
        .route("/api/v1/results/transactions", get(list_transactions))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Maps an error kind to its HTTP status.
///
/// Both unavailability kinds map to 503: the caller can retry either without
/// reasoning about which side of the system failed.
fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::MalformedArguments => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::LedgerRejected => StatusCode::CONFLICT,
        ErrorKind::LedgerUnavailable | ErrorKind::StoreUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorKind::SignerError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error body: stable machine-readable kind plus human-readable detail.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

struct ApiError(RegistryError);

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let body = ErrorBody { error: kind.as_str(), message: self.0.to_string() };
        (status_for(kind), Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct AddResultRequest {
    student_id: String,
    course_code: String,
    grade: String,
    semester: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WriteResponse {
    tx_hash: Option<String>,
    mirror_synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<ResultRecord>,
}

async fn add_result(
    State(service): State<Arc<ResultService>>,
    Json(req): Json<AddResultRequest>,
) -> ApiResult<(StatusCode, Json<WriteResponse>)> {
    let key = RecordKey::new(req.student_id, req.course_code, req.semester);
    let outcome = service.add_result(&key, &req.grade).await?;
    Ok((
        StatusCode::CREATED,
        Json(WriteResponse {
            tx_hash: outcome.receipt.digest,
            mirror_synced: outcome.mirror_synced,
            record: Some(outcome.record),
        }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadParams {
    student_id: String,
    course_code: Option<String>,
    semester: Option<String>,
}

impl From<ReadParams> for ResultQuery {
    fn from(params: ReadParams) -> Self {
        Self {
            student_id: params.student_id,
            course_code: params.course_code,
            semester: params.semester,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadResponse {
    source: ReadSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<ResultRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<Vec<ResultRecord>>,
}

async fn get_result(
    State(service): State<Arc<ResultService>>,
    Query(params): Query<ReadParams>,
) -> ApiResult<Json<ReadResponse>> {
    let query = ResultQuery::from(params);
    let outcome = service.get_result(&query).await?;
    let source = outcome.source();
    let response = match outcome {
        ReadOutcome::Ledger { value } => ReadResponse {
            source,
            grade: value.as_str().map(str::to_owned),
            record: None,
            records: None,
        },
        ReadOutcome::Mirror { record } => ReadResponse {
            source,
            grade: Some(record.grade.clone()),
            record: Some(record),
            records: None,
        },
        ReadOutcome::Listing { records } => ReadResponse {
            source,
            grade: None,
            record: None,
            records: Some(records),
        },
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UpdateGradeRequest {
    student_id: String,
    course_code: String,
    semester: String,
    new_grade: String,
}

async fn update_result(
    State(service): State<Arc<ResultService>>,
    Json(req): Json<UpdateGradeRequest>,
) -> ApiResult<Json<WriteResponse>> {
    let key = RecordKey::new(req.student_id, req.course_code, req.semester);
    let outcome = service.update_result(&key, &req.new_grade).await?;
    Ok(Json(WriteResponse {
        tx_hash: outcome.receipt.digest,
        mirror_synced: outcome.mirror_synced,
        record: outcome.record,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct VerifyRequest {
    student_id: String,
    course_code: String,
    semester: String,
}

impl VerifyRequest {
    fn into_key(self) -> RecordKey {
        RecordKey::new(self.student_id, self.course_code, self.semester)
    }
}

async fn verify_result(
    State(service): State<Arc<ResultService>>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let outcome = service.verify_result(&req.into_key()).await?;
    Ok(Json(serde_json::json!({ "txHash": outcome.receipt.digest })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyParams {
    student_id: String,
    course_code: String,
    semester: String,
}

impl KeyParams {
    fn into_key(self) -> RecordKey {
        RecordKey::new(self.student_id, self.course_code, self.semester)
    }
}

async fn result_exists(
    State(service): State<Arc<ResultService>>,
    Query(params): Query<KeyParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let exists = service.result_exists(&params.into_key()).await?;
    Ok(Json(serde_json::json!({ "exists": exists })))
}

async fn is_verified(
    State(service): State<Arc<ResultService>>,
    Query(params): Query<KeyParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let verified = service.is_verified(&params.into_key()).await?;
    Ok(Json(serde_json::json!({ "verified": verified })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentParams {
    student_id: String,
}

async fn list_transactions(
    State(service): State<Arc<ResultService>>,
    Query(params): Query<StudentParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let hashes = service.list_transaction_hashes(&params.student_id).await?;
    Ok(Json(serde_json::json!({ "txHashes": hashes })))
}

#[cfg(test)]
mod tests {
    use result_registry_types::error::{
        LedgerRejectedSnafu, MalformedArgumentsSnafu, NotFoundSnafu,
    };

    use super::*;

    #[test]
    fn error_kinds_map_to_expected_statuses() {
        assert_eq!(status_for(ErrorKind::MalformedArguments), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::LedgerRejected), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::LedgerUnavailable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(ErrorKind::StoreUnavailable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(ErrorKind::SignerError), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_body_carries_stable_kind_name() {
        let err: RegistryError =
            MalformedArgumentsSnafu { message: "studentId must be non-empty" }.build();
        let body = ErrorBody { error: err.kind().as_str(), message: err.to_string() };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "malformed_arguments");
        assert!(json["message"].as_str().unwrap().contains("studentId"));
    }

    #[test]
    fn rejection_and_absence_are_distinct_statuses() {
        let rejected: RegistryError = LedgerRejectedSnafu { message: "duplicate" }.build();
        let missing: RegistryError = NotFoundSnafu { message: "no such result" }.build();
        assert_ne!(status_for(rejected.kind()), status_for(missing.kind()));
    }
}
