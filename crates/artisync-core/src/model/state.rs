use super::declaration::{Artifact, ArtifactDeclaration, ArtifactEntity};
use super::lifecycle::ArtifactLifecycle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted lifecycle record, one per source location
///
/// `fingerprint` is the fingerprint of the last content that was applied
/// successfully. It only moves on a `SUCCESSFUL_CREATE_UPDATE` transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactState {
    pub location: String,
    pub name: String,
    pub artifact_type: String,
    pub natural_key: Option<String>,
    pub lifecycle: ArtifactLifecycle,
    pub error: Option<String>,
    pub fingerprint: Option<String>,
    pub depends_on: Vec<String>,
    /// Last parsed entity payload, handed back to the handler on DELETE
    pub payload: serde_json::Value,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

impl ArtifactState {
    /// Fresh record for a location seen for the first time
    ///
    /// The name defaults to the file stem until a handler parses the source.
    pub fn discovered(
        location: impl Into<String>,
        artifact_type: impl Into<String>,
        actor: &str,
    ) -> Self {
        let location = location.into();
        let now = Utc::now();
        Self {
            name: default_name(&location),
            location,
            artifact_type: artifact_type.into(),
            natural_key: None,
            lifecycle: ArtifactLifecycle::Discovered,
            error: None,
            fingerprint: None,
            depends_on: Vec::new(),
            payload: serde_json::Value::Null,
            created_by: actor.to_string(),
            created_at: now,
            updated_by: actor.to_string(),
            updated_at: now,
        }
    }

    /// Move to `lifecycle`, clearing any previous error and stamping audit fields
    pub fn transition(&mut self, lifecycle: ArtifactLifecycle, actor: &str) {
        self.lifecycle = lifecycle;
        self.error = None;
        self.updated_by = actor.to_string();
        self.updated_at = Utc::now();
    }

    /// Move to `lifecycle` and record why
    pub fn fail(&mut self, lifecycle: ArtifactLifecycle, error: impl Into<String>, actor: &str) {
        self.transition(lifecycle, actor);
        self.error = Some(error.into());
    }

    /// Copy name, key, dependencies and payload from a freshly parsed entity
    pub fn absorb_entity(&mut self, entity: &ArtifactEntity) {
        self.name = entity.name.clone();
        self.natural_key = entity.key.clone();
        self.depends_on = entity.depends_on.clone();
        self.payload = entity.payload.clone();
    }

    /// True when nothing needs doing for content with `fingerprint`
    pub fn is_up_to_date(&self, fingerprint: &str) -> bool {
        self.lifecycle == ArtifactLifecycle::SuccessfulCreateUpdate
            && self.fingerprint.as_deref() == Some(fingerprint)
    }

    /// Rebuild the artifact last applied at this location
    ///
    /// Raw content is not persisted, so the declaration carries none.
    pub fn to_artifact(&self) -> Artifact {
        let mut declaration = ArtifactDeclaration::new(
            self.location.clone(),
            self.name.clone(),
            self.artifact_type.clone(),
        )
        .with_depends_on(self.depends_on.iter().cloned());
        if let Some(fp) = &self.fingerprint {
            declaration.fingerprint = fp.clone();
        }
        let mut entity = ArtifactEntity::new(self.name.clone())
            .with_depends_on(self.depends_on.iter().cloned())
            .with_payload(self.payload.clone());
        entity.key = self.natural_key.clone();
        Artifact::new(declaration, entity)
    }
}

fn default_name(location: &str) -> String {
    let file = location.rsplit('/').next().unwrap_or(location);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovered_defaults() {
        let state = ArtifactState::discovered("/project/roles.role", "role", "system");
        assert_eq!(state.name, "roles");
        assert_eq!(state.lifecycle, ArtifactLifecycle::Discovered);
        assert!(state.fingerprint.is_none());
        assert_eq!(state.created_by, "system");
    }

    #[test]
    fn test_fail_records_error_and_transition_clears_it() {
        let mut state = ArtifactState::discovered("/a.table", "table", "system");
        state.fail(ArtifactLifecycle::FailedCreateUpdate, "bad column", "system");
        assert_eq!(state.error.as_deref(), Some("bad column"));

        state.transition(ArtifactLifecycle::Updated, "operator");
        assert!(state.error.is_none());
        assert_eq!(state.updated_by, "operator");
    }

    #[test]
    fn test_up_to_date_requires_success_and_same_fingerprint() {
        let mut state = ArtifactState::discovered("/a.table", "table", "system");
        state.fingerprint = Some("abc".to_string());
        assert!(!state.is_up_to_date("abc"));

        state.transition(ArtifactLifecycle::SuccessfulCreateUpdate, "system");
        assert!(state.is_up_to_date("abc"));
        assert!(!state.is_up_to_date("def"));
    }

    #[test]
    fn test_to_artifact_carries_payload_and_key() {
        let mut state = ArtifactState::discovered("/a.view", "view", "system");
        state.absorb_entity(
            &ArtifactEntity::new("active_users")
                .with_key("VIEW:ACTIVE_USERS")
                .with_depends_on(["users"])
                .with_payload(serde_json::json!({"query": "select 1"})),
        );
        let artifact = state.to_artifact();
        assert_eq!(artifact.name(), "active_users");
        assert_eq!(artifact.entity.key.as_deref(), Some("VIEW:ACTIVE_USERS"));
        assert_eq!(artifact.declaration.depends_on, vec!["users".to_string()]);
        assert_eq!(artifact.entity.payload["query"], "select 1");
    }
}
