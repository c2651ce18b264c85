use crate::model::ArtifactPhase;
use artisync_core_types::PassId;
use thiserror::Error;

/// Result type alias using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type alias for handler and state-store boundaries
pub type ExResult<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used in persisted artifact state,
/// pass reports, log events and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Declaration/Validation
    InvalidInput,
    NotFound,
    AlreadyExists,
    DuplicateLocation,
    CycleDetected,

    // Artifact lifecycle
    ParseFailed,
    ApplyFailed,
    HandlerNotRegistered,
    UnknownLifecycle,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    Configuration,
    Timeout,
    Concurrency,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::DuplicateLocation => "ERR_DUPLICATE_LOCATION",
            ExErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            ExErrorKind::ParseFailed => "ERR_PARSE_FAILED",
            ExErrorKind::ApplyFailed => "ERR_APPLY_FAILED",
            ExErrorKind::HandlerNotRegistered => "ERR_HANDLER_NOT_REGISTERED",
            ExErrorKind::UnknownLifecycle => "ERR_UNKNOWN_LIFECYCLE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification (`kind`) for programmatic handling plus the
/// artifact context needed to make a failure actionable.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    location: Option<String>,
    artifact_type: Option<String>,
    pass_id: Option<PassId>,
    message: String,
    source: Option<Box<ExError>>,
    members: Option<Vec<String>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            location: None,
            artifact_type: None,
            pass_id: None,
            message: String::new(),
            source: None,
            members: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add artifact location context
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Add artifact type context
    pub fn with_artifact_type(mut self, artifact_type: impl Into<String>) -> Self {
        self.artifact_type = Some(artifact_type.into());
        self
    }

    /// Add pass correlation
    pub fn with_pass_id(mut self, pass_id: PassId) -> Self {
        self.pass_id = Some(pass_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Add the members of a dependency cycle
    pub fn with_members(mut self, members: Vec<String>) -> Self {
        self.members = Some(members);
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the artifact location, if any
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Get the artifact type, if any
    pub fn artifact_type(&self) -> Option<&str> {
        self.artifact_type.as_deref()
    }

    /// Get the pass correlation, if any
    pub fn pass_id(&self) -> Option<&PassId> {
        self.pass_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    /// Get cycle members, if any (populated on CycleDetected)
    pub fn members(&self) -> Option<&[String]> {
        self.members.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(location) = &self.location {
            write!(f, " (location: {})", location)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for reconciliation operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Declared dependencies form a cycle; fatal for graph resolution
    #[error("Cyclic dependency between artifacts: {}", members.join(" -> "))]
    CyclicDependency { members: Vec<String> },

    /// Source content of one artifact could not be parsed
    #[error("Failed to parse artifact at {location}: {reason}")]
    Parse { location: String, reason: String },

    /// Handler side effect failed for one artifact
    #[error("Failed to apply {phase} to artifact at {location}: {reason}")]
    ApplyLifecycle {
        location: String,
        phase: ArtifactPhase,
        reason: String,
    },

    /// A pass exceeded its time budget
    #[error("Synchronization pass timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    /// No handler accepts this artifact type
    #[error("No handler registered for artifact type: {artifact_type}")]
    HandlerNotRegistered { artifact_type: String },

    /// A handler for this type was registered twice
    #[error("Handler already registered for artifact type: {artifact_type}")]
    DuplicateHandler { artifact_type: String },

    /// Two source roots produced the same location
    #[error("Duplicate artifact location: {location}")]
    DuplicateLocation { location: String },

    /// A persisted lifecycle string is not recognised
    #[error("Unknown artifact lifecycle: {value}")]
    UnknownLifecycle { value: String },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<SyncError> for ExError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::CyclicDependency { members } => ExError::new(ExErrorKind::CycleDetected)
                .with_op("resolve")
                .with_message(format!("Cyclic dependency: {}", members.join(" -> ")))
                .with_members(members),
            SyncError::Parse { location, reason } => ExError::new(ExErrorKind::ParseFailed)
                .with_op("parse")
                .with_location(location)
                .with_message(reason),
            SyncError::ApplyLifecycle {
                location,
                phase,
                reason,
            } => ExError::new(ExErrorKind::ApplyFailed)
                .with_op(format!("apply_lifecycle:{}", phase))
                .with_location(location)
                .with_message(reason),
            SyncError::Timeout { elapsed_ms } => ExError::new(ExErrorKind::Timeout)
                .with_op("sync_pass")
                .with_message(format!("Pass timed out after {} ms", elapsed_ms)),
            SyncError::HandlerNotRegistered { artifact_type } => {
                ExError::new(ExErrorKind::HandlerNotRegistered)
                    .with_artifact_type(artifact_type.clone())
                    .with_message(format!("No handler for type {}", artifact_type))
            }
            SyncError::DuplicateHandler { artifact_type } => {
                ExError::new(ExErrorKind::AlreadyExists)
                    .with_op("register_handler")
                    .with_artifact_type(artifact_type.clone())
                    .with_message(format!("Handler for type {} already registered", artifact_type))
            }
            SyncError::DuplicateLocation { location } => {
                ExError::new(ExErrorKind::DuplicateLocation)
                    .with_op("scan")
                    .with_location(location)
                    .with_message("Location produced by more than one source root")
            }
            SyncError::UnknownLifecycle { value } => ExError::new(ExErrorKind::UnknownLifecycle)
                .with_message(format!("Unknown lifecycle: {}", value)),
            SyncError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
            SyncError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to SyncError
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Build a parse error for a handler
pub fn parse_error(location: &str, reason: impl Into<String>) -> ExError {
    ExError::from(SyncError::Parse {
        location: location.to_string(),
        reason: reason.into(),
    })
}

/// Build an apply error for a handler
pub fn apply_error(location: &str, phase: ArtifactPhase, reason: impl Into<String>) -> ExError {
    ExError::from(SyncError::ApplyLifecycle {
        location: location.to_string(),
        phase,
        reason: reason.into(),
    })
}
