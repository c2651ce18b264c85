#![allow(clippy::unwrap_used, clippy::expect_used)]

use artisync_core::errors::{ExError, ExErrorKind, SyncError};
use artisync_core::logging_facility::test_capture::init_test_capture;
use artisync_core::ArtifactPhase;
use artisync_core::{log_artifact_failure, log_op_end, log_op_error, log_op_start};
use artisync_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};

#[test]
fn test_pass_events_are_grouped_by_pass_id() {
    let capture = init_test_capture();

    // Given: two operations of one pass
    log_op_start!("resolve", pass_id = "log-test-pass-1", artifacts = 2);
    log_op_end!("resolve", duration_ms = 42, pass_id = "log-test-pass-1");

    // When
    let events = capture.events_for_pass("log-test-pass-1");

    // Then
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
    assert_eq!(events[0].field("artifacts"), Some("2"));
    assert_eq!(events[1].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[1].field("duration_ms"), Some("42"));
}

#[test]
fn test_cycle_error_is_the_pass_outcome() {
    let capture = init_test_capture();

    // Given
    let err = SyncError::CyclicDependency {
        members: vec!["roles".to_string(), "access".to_string()],
    };

    // When
    log_op_start!("sync_pass", pass_id = "log-test-pass-2");
    log_op_error!("sync_pass", err, duration_ms = 10, pass_id = "log-test-pass-2");

    // Then
    let outcome = capture.pass_outcome("log-test-pass-2").unwrap();
    assert_eq!(outcome.event.as_deref(), Some(EVENT_END_ERROR));
    assert_eq!(outcome.field("err_code"), Some("ERR_CYCLE_DETECTED"));
    assert_eq!(outcome.level, tracing::Level::ERROR);
    assert!(outcome.message.unwrap().contains("roles"));
}

#[test]
fn test_artifact_failure_carries_location_and_code() {
    let capture = init_test_capture();

    // Given
    let err = ExError::new(ExErrorKind::ApplyFailed).with_message("grant refused");

    // When
    log_artifact_failure!(
        ArtifactPhase::Delete,
        "/log-test/roles.res",
        &err,
        pass_id = "log-test-pass-3"
    );

    // Then
    let failures = capture.artifact_failures("/log-test/roles.res");
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].level, tracing::Level::WARN);
    assert_eq!(failures[0].pass_id.as_deref(), Some("log-test-pass-3"));
    assert_eq!(failures[0].field("phase"), Some("DELETE"));
    assert_eq!(failures[0].field("err_code"), Some(err.code()));
    assert!(failures[0].message.as_deref().unwrap().contains("grant refused"));
}

#[test]
fn test_component_is_module_path() {
    let capture = init_test_capture();

    log_op_start!("test_component_unique_op");

    let events = capture.events_for_op("test_component_unique_op");
    assert_eq!(events[0].component.as_deref(), Some("logging_facility_tests"));
}
