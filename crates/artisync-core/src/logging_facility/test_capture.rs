//! In-memory event capture for log assertions in tests
//!
//! Installs a subscriber layer that keeps every event, with the pass and
//! artifact identifiers lifted out, so a test can ask what one pass logged
//! or why one artifact failed.

use artisync_core_types::schema::{
    EVENT_ARTIFACT_FAILED, EVENT_END, EVENT_END_ERROR, FIELD_COMPONENT, FIELD_EVENT,
    FIELD_LOCATION, FIELD_MESSAGE, FIELD_OP, FIELD_PASS_ID, OP_SYNC_PASS,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One captured event; every field is also kept verbatim in `fields`
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub component: Option<String>,
    pub op: Option<String>,
    pub event: Option<String>,
    pub pass_id: Option<String>,
    pub location: Option<String>,
    pub message: Option<String>,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn from_fields(level: Level, fields: HashMap<String, String>) -> Self {
        let get = |key: &str| fields.get(key).cloned();
        Self {
            level,
            component: get(FIELD_COMPONENT),
            op: get(FIELD_OP),
            event: get(FIELD_EVENT),
            pass_id: get(FIELD_PASS_ID),
            location: get(FIELD_LOCATION),
            message: get(FIELD_MESSAGE),
            fields,
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    fn is(&self, op: &str, event: &str) -> bool {
        self.op.as_deref() == Some(op) && self.event.as_deref() == Some(event)
    }
}

#[derive(Default)]
struct FieldVisitor(HashMap<String, String>);

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), value.to_string());
    }
}

struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let captured = CapturedEvent::from_fields(*event.metadata().level(), visitor.0);
        self.events
            .lock()
            .map(|mut events| events.push(captured))
            .ok();
    }
}

/// Shared handle on the captured events
#[derive(Clone)]
pub struct TestCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCapture {
    /// Every captured event, in emission order
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn events_for_op(&self, op: &str) -> Vec<CapturedEvent> {
        self.filtered(|e| e.op.as_deref() == Some(op))
    }

    /// Events stamped with `pass_id`, whatever operation emitted them
    pub fn events_for_pass(&self, pass_id: &str) -> Vec<CapturedEvent> {
        self.filtered(|e| e.pass_id.as_deref() == Some(pass_id))
    }

    /// The `sync_pass` end or end_error event of one pass
    pub fn pass_outcome(&self, pass_id: &str) -> Option<CapturedEvent> {
        self.events_for_pass(pass_id)
            .into_iter()
            .find(|e| e.is(OP_SYNC_PASS, EVENT_END) || e.is(OP_SYNC_PASS, EVENT_END_ERROR))
    }

    /// Failure events logged for the artifact at `location`
    pub fn artifact_failures(&self, location: &str) -> Vec<CapturedEvent> {
        self.filtered(|e| {
            e.event.as_deref() == Some(EVENT_ARTIFACT_FAILED)
                && e.location.as_deref() == Some(location)
        })
    }

    /// # Panics
    ///
    /// Panics if no event has this `op` and `event`
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let events = self.events();
        assert!(
            events.iter().any(|e| e.is(op, event)),
            "expected event op={} event={} not found in {} captured events",
            op,
            event,
            events.len()
        );
    }

    fn filtered(&self, keep: impl Fn(&CapturedEvent) -> bool) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .map(|events| events.iter().filter(|e| keep(e)).cloned().collect())
            .unwrap_or_default()
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture layer as the global subscriber on first use
///
/// All tests of one binary share the buffer, so filter by something unique
/// to the test: its pass id, an artifact location, or an op name.
///
/// ```
/// use artisync_core::logging_facility::test_capture::init_test_capture;
/// use artisync_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("sync_pass", pass_id = "doc-pass");
/// assert_eq!(capture.events_for_pass("doc-pass").len(), 1);
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let events = Arc::new(Mutex::new(Vec::new()));
            let layer = CaptureLayer {
                events: Arc::clone(&events),
            };
            tracing_subscriber::registry().with(layer).try_init().ok();
            TestCapture { events }
        })
        .clone()
}
