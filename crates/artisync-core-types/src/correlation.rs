//! Correlation types for pass tracking
//!
//! Every synchronization pass carries a `PassId` so that state writes,
//! ledger rows and log events emitted by one pass can be tied together.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one synchronization pass
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassId(String);

impl PassId {
    /// Generate a new PassId using UUIDv7 (time ordered)
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for rows read back from the ledger)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for PassId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What caused a pass to start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// The scheduler's periodic timer
    Periodic,
    /// An explicit `force_now` call (tests, operational tooling)
    Forced,
    /// A direct driver invocation outside the scheduler
    Direct,
}

impl TriggerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerSource::Periodic => "periodic",
            TriggerSource::Forced => "forced",
            TriggerSource::Direct => "direct",
        }
    }
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context carried through one pass for correlation
#[derive(Debug, Clone)]
pub struct PassContext {
    pub pass_id: PassId,
    pub trigger: TriggerSource,
}

impl PassContext {
    /// Create a new context with a fresh PassId
    pub fn new(trigger: TriggerSource) -> Self {
        Self {
            pass_id: PassId::new(),
            trigger,
        }
    }
}

impl Default for PassContext {
    fn default() -> Self {
        Self::new(TriggerSource::Direct)
    }
}
