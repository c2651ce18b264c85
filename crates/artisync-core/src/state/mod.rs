//! Lifecycle state store contract
//!
//! One `ArtifactState` per location plus the pass ledger. Every write is
//! durable on return; implementations backed by a database commit each
//! call in its own transaction.

pub mod memory;

pub use memory::MemoryStateStore;

use crate::errors::ExResult;
use crate::model::{ArtifactLifecycle, ArtifactState, PassSummary};

pub trait StateStore {
    /// State recorded for `location`, if any
    fn get(&self, location: &str) -> ExResult<Option<ArtifactState>>;

    /// Insert or replace the state for `state.location`
    fn upsert(&mut self, state: &ArtifactState) -> ExResult<()>;

    /// Physically remove a row; true if one existed
    fn remove(&mut self, location: &str) -> ExResult<bool>;

    /// All rows ordered by location
    fn list_all(&self) -> ExResult<Vec<ArtifactState>>;

    /// Rows of one artifact type ordered by location
    fn list_by_type(&self, artifact_type: &str) -> ExResult<Vec<ArtifactState>>;

    /// Rows in one lifecycle ordered by location
    fn list_by_lifecycle(&self, lifecycle: ArtifactLifecycle) -> ExResult<Vec<ArtifactState>>;

    /// Row of `artifact_type` carrying natural key `key`
    fn find_by_key(&self, artifact_type: &str, key: &str) -> ExResult<Option<ArtifactState>>;

    /// Append a pass to the ledger
    fn record_pass(&mut self, summary: &PassSummary) -> ExResult<()>;

    /// Most recent passes, newest first
    fn recent_passes(&self, limit: usize) -> ExResult<Vec<PassSummary>>;
}
