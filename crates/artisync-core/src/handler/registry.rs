use super::ArtifactHandler;
use crate::errors::{ExResult, SyncError};
use std::sync::Arc;

type FilePredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

struct Registration {
    artifact_type: String,
    predicate: Option<FilePredicate>,
    handler: Arc<dyn ArtifactHandler>,
}

impl Registration {
    fn accepts(&self, file_name: &str) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(file_name),
            None => self.handler.accepts(file_name),
        }
    }
}

/// Frozen registry shared between the driver and the scheduler
pub type SharedRegistry = Arc<HandlerRegistry>;

/// Maps artifact types to handlers, in registration order
///
/// Build it at startup, then call [`HandlerRegistry::freeze`]. Lookups by
/// file name return the first registration whose predicate accepts it.
#[derive(Default)]
pub struct HandlerRegistry {
    registrations: Vec<Registration>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under its own type, routed by its `accepts`
    ///
    /// # Errors
    ///
    /// Fails with `AlreadyExists` if the type is already registered.
    pub fn register<H>(&mut self, handler: H) -> ExResult<()>
    where
        H: ArtifactHandler + 'static,
    {
        let handler: Arc<dyn ArtifactHandler> = Arc::new(handler);
        let artifact_type = handler.artifact_type().to_string();
        self.push(artifact_type, None, handler)
    }

    /// Register `handler` under `artifact_type` with a custom file predicate
    ///
    /// # Errors
    ///
    /// Fails with `AlreadyExists` if the type is already registered.
    pub fn register_with_predicate<P>(
        &mut self,
        artifact_type: impl Into<String>,
        predicate: P,
        handler: Arc<dyn ArtifactHandler>,
    ) -> ExResult<()>
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.push(artifact_type.into(), Some(Box::new(predicate)), handler)
    }

    fn push(
        &mut self,
        artifact_type: String,
        predicate: Option<FilePredicate>,
        handler: Arc<dyn ArtifactHandler>,
    ) -> ExResult<()> {
        if self.get(&artifact_type).is_some() {
            return Err(SyncError::DuplicateHandler { artifact_type }.into());
        }
        tracing::debug!(artifact_type = %artifact_type, "handler registered");
        self.registrations.push(Registration {
            artifact_type,
            predicate,
            handler,
        });
        Ok(())
    }

    /// Make the registry immutable and shareable
    pub fn freeze(self) -> SharedRegistry {
        Arc::new(self)
    }

    pub fn get(&self, artifact_type: &str) -> Option<&Arc<dyn ArtifactHandler>> {
        self.registrations
            .iter()
            .find(|r| r.artifact_type == artifact_type)
            .map(|r| &r.handler)
    }

    /// First registration accepting `file_name`, as `(type, handler)`
    pub fn handler_for_file(&self, file_name: &str) -> Option<(&str, &Arc<dyn ArtifactHandler>)> {
        self.registrations
            .iter()
            .find(|r| r.accepts(file_name))
            .map(|r| (r.artifact_type.as_str(), &r.handler))
    }

    /// Registered types, in registration order
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.registrations.iter().map(|r| r.artifact_type.as_str())
    }

    pub fn handlers(&self) -> impl Iterator<Item = (&str, &Arc<dyn ArtifactHandler>)> {
        self.registrations
            .iter()
            .map(|r| (r.artifact_type.as_str(), &r.handler))
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("types", &self.types().collect::<Vec<_>>())
            .finish()
    }
}
