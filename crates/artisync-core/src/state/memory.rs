use super::StateStore;
use crate::errors::ExResult;
use crate::model::{ArtifactLifecycle, ArtifactState, PassSummary};
use std::collections::BTreeMap;

/// In-memory state store, used by tests and embedders without a database
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    states: BTreeMap<String, ArtifactState>,
    passes: Vec<PassSummary>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, location: &str) -> ExResult<Option<ArtifactState>> {
        Ok(self.states.get(location).cloned())
    }

    fn upsert(&mut self, state: &ArtifactState) -> ExResult<()> {
        self.states.insert(state.location.clone(), state.clone());
        Ok(())
    }

    fn remove(&mut self, location: &str) -> ExResult<bool> {
        Ok(self.states.remove(location).is_some())
    }

    fn list_all(&self) -> ExResult<Vec<ArtifactState>> {
        Ok(self.states.values().cloned().collect())
    }

    fn list_by_type(&self, artifact_type: &str) -> ExResult<Vec<ArtifactState>> {
        Ok(self
            .states
            .values()
            .filter(|s| s.artifact_type == artifact_type)
            .cloned()
            .collect())
    }

    fn list_by_lifecycle(&self, lifecycle: ArtifactLifecycle) -> ExResult<Vec<ArtifactState>> {
        Ok(self
            .states
            .values()
            .filter(|s| s.lifecycle == lifecycle)
            .cloned()
            .collect())
    }

    fn find_by_key(&self, artifact_type: &str, key: &str) -> ExResult<Option<ArtifactState>> {
        Ok(self
            .states
            .values()
            .find(|s| s.artifact_type == artifact_type && s.natural_key.as_deref() == Some(key))
            .cloned())
    }

    fn record_pass(&mut self, summary: &PassSummary) -> ExResult<()> {
        self.passes.push(summary.clone());
        Ok(())
    }

    fn recent_passes(&self, limit: usize) -> ExResult<Vec<PassSummary>> {
        Ok(self.passes.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArtifactEntity, PassReport};
    use artisync_core_types::PassContext;

    #[test]
    fn test_upsert_get_remove() {
        let mut store = MemoryStateStore::new();
        let state = ArtifactState::discovered("/a.table", "table", "system");

        store.upsert(&state).unwrap();
        assert_eq!(store.get("/a.table").unwrap(), Some(state));

        assert!(store.remove("/a.table").unwrap());
        assert!(!store.remove("/a.table").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_find_by_key_is_scoped_to_type() {
        let mut store = MemoryStateStore::new();
        let mut state = ArtifactState::discovered("/a.table", "table", "system");
        state.absorb_entity(&ArtifactEntity::new("a").with_key("A"));
        store.upsert(&state).unwrap();

        assert!(store.find_by_key("table", "A").unwrap().is_some());
        assert!(store.find_by_key("view", "A").unwrap().is_none());
    }

    #[test]
    fn test_lists_are_ordered_by_location() {
        let mut store = MemoryStateStore::new();
        for loc in ["/c.table", "/a.table", "/b.view"] {
            let ty = if loc.ends_with("view") { "view" } else { "table" };
            store
                .upsert(&ArtifactState::discovered(loc, ty, "system"))
                .unwrap();
        }
        let all: Vec<_> = store.list_all().unwrap().into_iter().map(|s| s.location).collect();
        assert_eq!(all, vec!["/a.table", "/b.view", "/c.table"]);
        assert_eq!(store.list_by_type("table").unwrap().len(), 2);
        assert_eq!(
            store
                .list_by_lifecycle(ArtifactLifecycle::Discovered)
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn test_recent_passes_newest_first() {
        let mut store = MemoryStateStore::new();
        let first = PassReport::new(&PassContext::default()).finish().summary();
        let second = PassReport::new(&PassContext::default()).finish().summary();
        store.record_pass(&first).unwrap();
        store.record_pass(&second).unwrap();

        let recent = store.recent_passes(1).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].pass_id, second.pass_id);
    }
}
