//! artisync core - artifact reconciliation kernel
//!
//! Provides the pieces of a synchronization pass that do not touch the
//! filesystem or a database:
//! - Artifact model, lifecycle and pass report types
//! - Dependency graph builder and depth-first topological resolver
//! - Fixed-point depleter isolating per-artifact failures
//! - Handler contract and registry
//! - State store contract with an in-memory implementation
//! - Error and logging facilities shared by every crate

pub mod depleter;
pub mod errors;
pub mod fingerprint;
pub mod graph;
pub mod handler;
pub mod logging_facility;
pub mod model;
pub mod state;

// Re-export commonly used types
pub use depleter::{deplete, Depletion, DepletionFailure};
pub use errors::{ExError, ExErrorKind, ExResult, Result, SyncError};
pub use graph::{build_graph, resolve, DependencyGraph, DependencyGraphNode, Resolution};
pub use handler::{ArtifactHandler, HandlerRegistry, SharedRegistry};
pub use model::{
    Artifact, ArtifactDeclaration, ArtifactEntity, ArtifactLifecycle, ArtifactPhase,
    ArtifactState, PassReport, PassStatus, PassSummary, SourceFile,
};
pub use state::{MemoryStateStore, StateStore};
