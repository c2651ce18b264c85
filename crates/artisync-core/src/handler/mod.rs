//! Artifact handler contract
//!
//! A handler owns one artifact type: it parses source content into an
//! entity and performs the only external side effect of a pass,
//! `apply_lifecycle`. Handlers are registered once at startup in a
//! [`HandlerRegistry`] and shared read-only afterwards.

pub mod registry;

pub use registry::{HandlerRegistry, SharedRegistry};

use crate::errors::ExResult;
use crate::model::{Artifact, ArtifactEntity, ArtifactPhase, ArtifactState};
use crate::state::StateStore;

pub trait ArtifactHandler: Send + Sync {
    /// Type tag this handler owns, e.g. `table`
    fn artifact_type(&self) -> &str;

    /// File extension (without the dot) of sources this handler reads
    fn file_extension(&self) -> Option<&str> {
        None
    }

    /// Whether a file name or type tag belongs to this handler
    ///
    /// Default: the type tag itself, or a name ending in `.<file_extension>`.
    fn accepts(&self, file_name_or_type: &str) -> bool {
        if file_name_or_type == self.artifact_type() {
            return true;
        }
        match self.file_extension() {
            Some(ext) => file_name_or_type
                .rsplit_once('.')
                .map(|(_, e)| e == ext)
                .unwrap_or(false),
            None => false,
        }
    }

    /// Validate and materialize one source
    ///
    /// `state` is read-only here; handlers may use `find_by_key` to keep an
    /// entity's identity when its source moves.
    ///
    /// # Errors
    ///
    /// A parse error fails only this artifact.
    fn parse(
        &self,
        location: &str,
        raw_content: &[u8],
        state: &dyn StateStore,
    ) -> ExResult<ArtifactEntity>;

    /// Previously materialized artifacts at or under `location_prefix`
    ///
    /// `artifact_type` is the type the handler is registered under. Rows are
    /// stored with that type, which is not necessarily
    /// [`artifact_type`](Self::artifact_type) for a predicate registration.
    ///
    /// # Errors
    ///
    /// Propagates state store failures.
    fn retrieve_existing(
        &self,
        artifact_type: &str,
        location_prefix: &str,
        state: &dyn StateStore,
    ) -> ExResult<Vec<Artifact>> {
        Ok(state
            .list_by_type(artifact_type)?
            .into_iter()
            .filter(|s| s.location.starts_with(location_prefix))
            .map(|s| s.to_artifact())
            .collect())
    }

    /// Apply a create/update or delete to the running system
    ///
    /// # Errors
    ///
    /// An apply error fails only this artifact; the pass continues.
    fn apply_lifecycle(&self, artifact: &Artifact, phase: ArtifactPhase) -> ExResult<()>;

    /// Persist a new lifecycle record
    ///
    /// Overrides may mirror the record into handler-owned tables but must
    /// still write it to `store`.
    ///
    /// # Errors
    ///
    /// Propagates state store failures.
    fn record_state(&self, store: &mut dyn StateStore, record: &ArtifactState) -> ExResult<()> {
        store.upsert(record)
    }
}
