use super::lifecycle::ArtifactPhase;
use crate::errors::SyncError;
use artisync_core_types::{PassContext, PassId, TriggerSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Overall outcome of one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassStatus {
    Completed,
    CompletedWithErrors,
    /// Dependency graph contained a cycle; no graph member was touched
    AbortedCycle,
    /// A source root could not be read; no cleanup was attempted
    AbortedScan,
}

impl PassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassStatus::Completed => "COMPLETED",
            PassStatus::CompletedWithErrors => "COMPLETED_WITH_ERRORS",
            PassStatus::AbortedCycle => "ABORTED_CYCLE",
            PassStatus::AbortedScan => "ABORTED_SCAN",
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, PassStatus::AbortedCycle | PassStatus::AbortedScan)
    }
}

impl FromStr for PassStatus {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMPLETED" => Ok(PassStatus::Completed),
            "COMPLETED_WITH_ERRORS" => Ok(PassStatus::CompletedWithErrors),
            "ABORTED_CYCLE" => Ok(PassStatus::AbortedCycle),
            "ABORTED_SCAN" => Ok(PassStatus::AbortedScan),
            other => Err(SyncError::Internal {
                message: format!("unknown pass status: {}", other),
            }),
        }
    }
}

impl std::fmt::Display for PassStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedArtifact {
    pub location: String,
    pub phase: ArtifactPhase,
    pub message: String,
}

/// An artifact whose dependencies never succeeded during the pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedArtifact {
    pub location: String,
    pub missing: Vec<String>,
}

/// Structured result of one synchronization pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub pass_id: PassId,
    pub trigger: TriggerSource,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: PassStatus,
    pub scanned: usize,
    pub unchanged: usize,
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedArtifact>,
    pub blocked: Vec<BlockedArtifact>,
    pub deleted: Vec<String>,
    pub external_dependencies: Vec<String>,
    pub cycle: Option<Vec<String>>,
    /// Every error of the pass, in the order it was encountered
    pub errors: Vec<String>,
}

impl PassReport {
    pub fn new(ctx: &PassContext) -> Self {
        Self {
            pass_id: ctx.pass_id.clone(),
            trigger: ctx.trigger,
            started_at: Utc::now(),
            finished_at: None,
            status: PassStatus::Completed,
            scanned: 0,
            unchanged: 0,
            succeeded: Vec::new(),
            failed: Vec::new(),
            blocked: Vec::new(),
            deleted: Vec::new(),
            external_dependencies: Vec::new(),
            cycle: None,
            errors: Vec::new(),
        }
    }

    pub fn record_failure(
        &mut self,
        location: impl Into<String>,
        phase: ArtifactPhase,
        message: impl Into<String>,
    ) {
        let location = location.into();
        let message = message.into();
        self.errors
            .push(format!("{} [{}]: {}", location, phase, message));
        self.failed.push(FailedArtifact {
            location,
            phase,
            message,
        });
    }

    pub fn record_blocked(&mut self, location: impl Into<String>, missing: Vec<String>) {
        let location = location.into();
        self.errors.push(format!(
            "{} blocked by unresolved dependencies: {}",
            location,
            missing.join(", ")
        ));
        self.blocked.push(BlockedArtifact { location, missing });
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn abort_scan(&mut self, message: impl Into<String>) {
        self.status = PassStatus::AbortedScan;
        self.errors.push(message.into());
    }

    pub fn abort_cycle(&mut self, members: Vec<String>) {
        self.status = PassStatus::AbortedCycle;
        self.errors
            .push(SyncError::CyclicDependency {
                members: members.clone(),
            }
            .to_string());
        self.cycle = Some(members);
    }

    /// Stamp the finish time and settle the status
    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        if !self.status.is_aborted() {
            self.status = if self.errors.is_empty() {
                PassStatus::Completed
            } else {
                PassStatus::CompletedWithErrors
            };
        }
        self
    }

    pub fn duration_ms(&self) -> i64 {
        self.finished_at
            .map(|f| (f - self.started_at).num_milliseconds())
            .unwrap_or(0)
    }

    pub fn summary(&self) -> PassSummary {
        PassSummary {
            pass_id: self.pass_id.clone(),
            trigger: self.trigger,
            started_at: self.started_at,
            finished_at: self.finished_at.unwrap_or(self.started_at),
            status: self.status,
            scanned: self.scanned,
            unchanged: self.unchanged,
            succeeded: self.succeeded.len(),
            failed: self.failed.len(),
            blocked: self.blocked.len(),
            deleted: self.deleted.len(),
            errors: self.errors.clone(),
        }
    }
}

/// Compact pass ledger row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassSummary {
    pub pass_id: PassId,
    pub trigger: TriggerSource,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: PassStatus,
    pub scanned: usize,
    pub unchanged: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub blocked: usize,
    pub deleted: usize,
    pub errors: Vec<String>,
}
