//! Canonical schema constants for structured logging and events
//!
//! These constants keep the field names of pass, artifact and error events
//! consistent across the engine, the store and the scheduler.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_PASS_ID: &str = "pass_id";
pub const FIELD_TRIGGER: &str = "trigger";

// Artifact identifiers
pub const FIELD_LOCATION: &str = "location";
pub const FIELD_ARTIFACT_TYPE: &str = "artifact_type";
pub const FIELD_LIFECYCLE: &str = "lifecycle";
pub const FIELD_PHASE: &str = "phase";

// Collection sizes
pub const FIELD_SCANNED: &str = "scanned";
pub const FIELD_SUCCEEDED: &str = "succeeded";
pub const FIELD_FAILED: &str = "failed";
pub const FIELD_BLOCKED: &str = "blocked";
pub const FIELD_DELETED: &str = "deleted";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";
pub const FIELD_MESSAGE: &str = "message";

// Operation names shared by the engine and log assertions
pub const OP_SYNC_PASS: &str = "sync_pass";
pub const OP_ARTIFACT: &str = "artifact";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_SKIPPED: &str = "skipped";
/// One artifact failed a lifecycle phase; the pass carries on
pub const EVENT_ARTIFACT_FAILED: &str = "artifact_failed";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_accessibility() {
        assert!(!FIELD_COMPONENT.is_empty());
        assert!(!FIELD_OP.is_empty());
        assert!(!FIELD_PASS_ID.is_empty());
        assert!(!EVENT_START.is_empty());
        assert!(!EVENT_END.is_empty());
        assert!(!EVENT_END_ERROR.is_empty());
    }

    #[test]
    fn test_event_names_are_distinct() {
        let events = [
            EVENT_START,
            EVENT_END,
            EVENT_END_ERROR,
            EVENT_SKIPPED,
            EVENT_ARTIFACT_FAILED,
        ];
        for (i, a) in events.iter().enumerate() {
            for b in events.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
