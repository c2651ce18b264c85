//! Domain model for artifact reconciliation

pub mod declaration;
pub mod lifecycle;
pub mod report;
pub mod state;

pub use declaration::{Artifact, ArtifactDeclaration, ArtifactEntity, SourceFile};
pub use lifecycle::{ArtifactLifecycle, ArtifactPhase};
pub use report::{BlockedArtifact, FailedArtifact, PassReport, PassStatus, PassSummary};
pub use state::ArtifactState;
