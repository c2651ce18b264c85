use crate::fingerprint::compute_fingerprint;
use artisync_core_types::Sensitive;
use serde::{Deserialize, Serialize};

/// A source file picked up by the scanner, before any handler has parsed it
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Root-relative path with a leading `/`, e.g. `/project/roles.role`
    pub location: String,
    pub artifact_type: String,
    pub fingerprint: String,
    pub raw_content: Sensitive<Vec<u8>>,
}

impl SourceFile {
    /// Wrap raw bytes read from `location`, computing their fingerprint
    pub fn new(
        location: impl Into<String>,
        artifact_type: impl Into<String>,
        raw_content: Vec<u8>,
    ) -> Self {
        let fingerprint = compute_fingerprint(&raw_content);
        Self {
            location: location.into(),
            artifact_type: artifact_type.into(),
            fingerprint,
            raw_content: Sensitive::new(raw_content),
        }
    }
}

/// A unit of configuration declared at one source location
///
/// `location` is the identity key and is unique within a pass.
/// `depends_on` holds artifact names, which may point outside the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactDeclaration {
    pub location: String,
    pub name: String,
    pub artifact_type: String,
    pub fingerprint: String,
    pub depends_on: Vec<String>,
    pub raw_content: Sensitive<Vec<u8>>,
}

impl ArtifactDeclaration {
    /// Declaration with no content and no dependencies
    pub fn new(
        location: impl Into<String>,
        name: impl Into<String>,
        artifact_type: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            name: name.into(),
            artifact_type: artifact_type.into(),
            fingerprint: compute_fingerprint(&[]),
            depends_on: Vec::new(),
            raw_content: Sensitive::new(Vec::new()),
        }
    }

    pub fn with_depends_on<I, S>(mut self, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = depends_on.into_iter().map(Into::into).collect();
        self
    }

    /// Combine a scanned file with the entity its handler parsed from it
    pub fn from_parsed(source: &SourceFile, entity: &ArtifactEntity) -> Self {
        Self {
            location: source.location.clone(),
            name: entity.name.clone(),
            artifact_type: source.artifact_type.clone(),
            fingerprint: source.fingerprint.clone(),
            depends_on: entity.depends_on.clone(),
            raw_content: source.raw_content.clone(),
        }
    }
}

/// Handler-materialized form of a declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEntity {
    pub name: String,
    /// Natural key preserving identity when a source moves to a new location
    pub key: Option<String>,
    pub depends_on: Vec<String>,
    pub payload: serde_json::Value,
}

impl ArtifactEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
            depends_on: Vec::new(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_depends_on<I, S>(mut self, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = depends_on.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// A declaration paired with its parsed entity
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub declaration: ArtifactDeclaration,
    pub entity: ArtifactEntity,
}

impl Artifact {
    pub fn new(declaration: ArtifactDeclaration, entity: ArtifactEntity) -> Self {
        Self {
            declaration,
            entity,
        }
    }

    pub fn location(&self) -> &str {
        &self.declaration.location
    }

    pub fn artifact_type(&self) -> &str {
        &self.declaration.artifact_type
    }

    pub fn name(&self) -> &str {
        &self.entity.name
    }
}
