// Integration tests for the pass ledger

#![allow(clippy::unwrap_used, clippy::expect_used)]

use artisync_core::model::{ArtifactPhase, PassReport, PassStatus};
use artisync_core::state::StateStore;
use artisync_core_types::{PassContext, TriggerSource};
use artisync_store::repo::PassLedger;
use artisync_store::SqliteStateStore;

#[test]
fn test_record_and_read_back_summary() {
    // Given: a finished pass with one failure
    let mut store = SqliteStateStore::open_in_memory().unwrap();
    let mut report = PassReport::new(&PassContext::new(TriggerSource::Periodic));
    report.scanned = 4;
    report.unchanged = 2;
    report.succeeded.push("/a.table".to_string());
    report.record_failure("/b.view", ArtifactPhase::CreateUpdate, "unknown column");
    let summary = report.finish().summary();

    // When: it is recorded
    store.record_pass(&summary).unwrap();

    // Then: the ledger returns it unchanged
    let loaded = PassLedger::get(store.connection(), &summary.pass_id)
        .unwrap()
        .unwrap();
    assert_eq!(loaded.status, PassStatus::CompletedWithErrors);
    assert_eq!(loaded.trigger, TriggerSource::Periodic);
    assert_eq!(loaded.scanned, 4);
    assert_eq!(loaded.unchanged, 2);
    assert_eq!(loaded.succeeded, 1);
    assert_eq!(loaded.failed, 1);
    assert_eq!(loaded.errors, summary.errors);
}

#[test]
fn test_recent_passes_newest_first_with_limit() {
    let mut store = SqliteStateStore::open_in_memory().unwrap();
    let mut ids = Vec::new();
    for _ in 0..3 {
        let summary = PassReport::new(&PassContext::default()).finish().summary();
        ids.push(summary.pass_id.clone());
        store.record_pass(&summary).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
    }

    let recent = store.recent_passes(2).unwrap();

    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].pass_id, ids[2]);
    assert_eq!(recent[1].pass_id, ids[1]);
}

#[test]
fn test_duplicate_pass_id_rejected() {
    let mut store = SqliteStateStore::open_in_memory().unwrap();
    let summary = PassReport::new(&PassContext::default()).finish().summary();
    store.record_pass(&summary).unwrap();

    assert!(store.record_pass(&summary).is_err());
}
