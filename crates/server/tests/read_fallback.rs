//! Read-path fallback behavior when the ledger or the mirror is down.

mod common;

use std::sync::Arc;

use result_registry_server::{FailingMirror, MirrorStore, ReadOutcome, ReadSource, ResultQuery};
use result_registry_types::{ErrorKind, RecordKey};

fn full_query(student: &str, course: &str, semester: &str) -> ResultQuery {
    ResultQuery {
        student_id: student.to_owned(),
        course_code: Some(course.to_owned()),
        semester: Some(semester.to_owned()),
    }
}

#[tokio::test]
async fn ledger_outage_is_answered_from_the_mirror() {
    let h = common::harness().await;
    let key = RecordKey::new("S100", "CS201", "Fall2024");
    h.service.add_result(&key, "A").await.unwrap();

    h.ledger.inject_unavailable(100);

    let outcome = h.service.get_result(&full_query("S100", "CS201", "Fall2024")).await.unwrap();
    assert_eq!(outcome.source(), ReadSource::Mirror);
    match outcome {
        ReadOutcome::Mirror { record } => assert_eq!(record.grade, "A"),
        other => panic!("expected mirror fallback, got {other:?}"),
    }
}

#[tokio::test]
async fn mirror_and_ledger_agree_on_the_grade() {
    let h = common::harness().await;
    let key = RecordKey::new("S100", "CS201", "Fall2024");
    h.service.add_result(&key, "A").await.unwrap();

    let from_ledger =
        h.service.get_result(&full_query("S100", "CS201", "Fall2024")).await.unwrap();
    let ReadOutcome::Ledger { value } = from_ledger else {
        panic!("expected ledger read");
    };

    h.ledger.inject_unavailable(100);
    let from_mirror =
        h.service.get_result(&full_query("S100", "CS201", "Fall2024")).await.unwrap();
    let ReadOutcome::Mirror { record } = from_mirror else {
        panic!("expected mirror fallback");
    };

    assert_eq!(value.as_str(), Some(record.grade.as_str()));
}

#[tokio::test]
async fn both_sources_down_is_not_found() {
    let (ledger, service) =
        common::service_with_mirror(Arc::new(FailingMirror) as Arc<dyn MirrorStore>).await;
    ledger.inject_unavailable(100);

    let err = service.get_result(&full_query("S100", "CS201", "Fall2024")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn missing_everywhere_is_not_found() {
    let h = common::harness().await;
    let err = h.service.get_result(&full_query("S999", "CS201", "Fall2024")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn partial_key_is_not_found_without_contacting_the_ledger() {
    let h = common::harness().await;

    let course_only = ResultQuery {
        student_id: "S100".to_owned(),
        course_code: Some("CS201".to_owned()),
        semester: None,
    };
    let err = h.service.get_result(&course_only).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let semester_only = ResultQuery {
        student_id: "S100".to_owned(),
        course_code: None,
        semester: Some("Fall2024".to_owned()),
    };
    let err = h.service.get_result(&semester_only).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(h.ledger.request_count(), 0);
}

#[tokio::test]
async fn empty_listing_is_not_found() {
    let h = common::harness().await;
    let query = ResultQuery { student_id: "S404".to_owned(), course_code: None, semester: None };
    let err = h.service.get_result(&query).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn blank_student_id_is_malformed() {
    let h = common::harness().await;
    let query = ResultQuery { student_id: "  ".to_owned(), course_code: None, semester: None };
    let err = h.service.get_result(&query).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedArguments);
}

#[tokio::test]
async fn existence_check_falls_back_to_mirror_presence() {
    let h = common::harness().await;
    let key = RecordKey::new("S100", "CS201", "Fall2024");
    h.service.add_result(&key, "A").await.unwrap();

    h.ledger.inject_unavailable(100);

    assert!(h.service.result_exists(&key).await.unwrap());
    let absent = RecordKey::new("S100", "CS201", "Spring2025");
    assert!(!h.service.result_exists(&absent).await.unwrap());
}

#[tokio::test]
async fn verification_check_has_no_mirror_fallback() {
    let h = common::harness().await;
    let key = RecordKey::new("S100", "CS201", "Fall2024");
    h.service.add_result(&key, "A").await.unwrap();

    h.ledger.inject_unavailable(100);

    let err = h.service.is_verified(&key).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LedgerUnavailable);
}
