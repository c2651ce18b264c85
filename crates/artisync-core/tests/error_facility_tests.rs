use artisync_core::errors::{apply_error, parse_error, ExError, ExErrorKind, SyncError};
use artisync_core::ArtifactPhase;
use artisync_core_types::PassId;

#[test]
fn test_cycle_verifiable_by_kind_and_members() {
    let err = SyncError::CyclicDependency {
        members: vec!["A".to_string(), "B".to_string()],
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::CycleDetected);
    assert_eq!(ex_err.code(), "ERR_CYCLE_DETECTED");
    assert_eq!(ex_err.members().map(|m| m.len()), Some(2));
    assert!(ex_err.message().contains("A -> B"));
}

#[test]
fn test_parse_failure_carries_location() {
    let ex_err = parse_error("/project/users.table", "missing column list");

    assert_eq!(ex_err.kind(), ExErrorKind::ParseFailed);
    assert_eq!(ex_err.location(), Some("/project/users.table"));
    assert_eq!(ex_err.op(), Some("parse"));
    assert_eq!(ex_err.message(), "missing column list");
}

#[test]
fn test_apply_failure_names_phase() {
    let ex_err = apply_error("/jobs/nightly.job", ArtifactPhase::Delete, "scheduler offline");

    assert_eq!(ex_err.kind(), ExErrorKind::ApplyFailed);
    assert_eq!(ex_err.op(), Some("apply_lifecycle:DELETE"));
    assert_eq!(ex_err.location(), Some("/jobs/nightly.job"));
}

#[test]
fn test_duplicate_handler_maps_to_already_exists() {
    let ex_err: ExError = SyncError::DuplicateHandler {
        artifact_type: "table".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::AlreadyExists);
    assert_eq!(ex_err.artifact_type(), Some("table"));
}

#[test]
fn test_timeout_is_distinct_kind() {
    let ex_err: ExError = SyncError::Timeout { elapsed_ms: 300_000 }.into();
    assert_eq!(ex_err.kind(), ExErrorKind::Timeout);
    assert_eq!(ex_err.code(), "ERR_TIMEOUT");
}

#[test]
fn test_error_kind_codes_are_unique() {
    let kinds = [
        ExErrorKind::InvalidInput,
        ExErrorKind::NotFound,
        ExErrorKind::AlreadyExists,
        ExErrorKind::DuplicateLocation,
        ExErrorKind::CycleDetected,
        ExErrorKind::ParseFailed,
        ExErrorKind::ApplyFailed,
        ExErrorKind::HandlerNotRegistered,
        ExErrorKind::UnknownLifecycle,
        ExErrorKind::Io,
        ExErrorKind::Serialization,
        ExErrorKind::Persistence,
        ExErrorKind::Configuration,
        ExErrorKind::Timeout,
        ExErrorKind::Concurrency,
        ExErrorKind::Internal,
    ];

    let mut codes: Vec<&str> = kinds.iter().map(|k| k.code()).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), kinds.len());
}

#[test]
fn test_builder_context() {
    let pass_id = PassId::new();
    let ex_err = ExError::new(ExErrorKind::Persistence)
        .with_op("upsert_state")
        .with_artifact_type("view")
        .with_pass_id(pass_id.clone())
        .with_message("database is locked");

    assert_eq!(ex_err.pass_id(), Some(&pass_id));
    assert_eq!(ex_err.artifact_type(), Some("view"));
    assert_eq!(
        ex_err.to_string(),
        "[ERR_PERSISTENCE] in operation 'upsert_state': database is locked"
    );
}

#[test]
fn test_serde_json_error_becomes_serialization() {
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: SyncError = json_err.into();
    let ex_err: ExError = err.into();
    assert_eq!(ex_err.kind(), ExErrorKind::Serialization);
}
