use crate::errors::SyncError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Persisted lifecycle of one artifact
///
/// Stored as its SCREAMING_SNAKE_CASE string. The happy path is
/// `DISCOVERED -> CREATED | UPDATED -> SUCCESSFUL_CREATE_UPDATE`, removal
/// goes `MISSING_FROM_SOURCE -> SUCCESSFUL_DELETE` and then the row is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactLifecycle {
    Discovered,
    Created,
    Updated,
    SuccessfulCreateUpdate,
    FailedCreateUpdate,
    MissingFromSource,
    SuccessfulDelete,
    FailedDelete,
}

impl ArtifactLifecycle {
    pub const ALL: [ArtifactLifecycle; 8] = [
        ArtifactLifecycle::Discovered,
        ArtifactLifecycle::Created,
        ArtifactLifecycle::Updated,
        ArtifactLifecycle::SuccessfulCreateUpdate,
        ArtifactLifecycle::FailedCreateUpdate,
        ArtifactLifecycle::MissingFromSource,
        ArtifactLifecycle::SuccessfulDelete,
        ArtifactLifecycle::FailedDelete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactLifecycle::Discovered => "DISCOVERED",
            ArtifactLifecycle::Created => "CREATED",
            ArtifactLifecycle::Updated => "UPDATED",
            ArtifactLifecycle::SuccessfulCreateUpdate => "SUCCESSFUL_CREATE_UPDATE",
            ArtifactLifecycle::FailedCreateUpdate => "FAILED_CREATE_UPDATE",
            ArtifactLifecycle::MissingFromSource => "MISSING_FROM_SOURCE",
            ArtifactLifecycle::SuccessfulDelete => "SUCCESSFUL_DELETE",
            ArtifactLifecycle::FailedDelete => "FAILED_DELETE",
        }
    }

    /// True for the two failure states
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            ArtifactLifecycle::FailedCreateUpdate | ArtifactLifecycle::FailedDelete
        )
    }
}

impl FromStr for ArtifactLifecycle {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactLifecycle::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| SyncError::UnknownLifecycle {
                value: s.to_string(),
            })
    }
}

impl std::fmt::Display for ArtifactLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which transition a handler is asked to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactPhase {
    CreateUpdate,
    Delete,
}

impl ArtifactPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactPhase::CreateUpdate => "CREATE_UPDATE",
            ArtifactPhase::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for ArtifactPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
