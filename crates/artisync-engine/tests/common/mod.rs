//! Shared fixtures for engine integration tests
//!
//! `ResourceHandler` owns `.res` files with a tiny line format:
//!
//! ```text
//! name: orders
//! depends: users, products
//! ```
//!
//! A line `invalid` makes parsing fail. Apply behavior is scripted per name
//! through the shared `Script`.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use artisync_core::errors::{apply_error, parse_error, ExResult};
use artisync_core::state::{MemoryStateStore, StateStore};
use artisync_core::{
    Artifact, ArtifactEntity, ArtifactHandler, ArtifactPhase, HandlerRegistry, SharedRegistry,
};
use artisync_engine::SyncDriver;
use tempfile::TempDir;

#[derive(Default)]
pub struct Script {
    pub calls: Mutex<Vec<(String, ArtifactPhase)>>,
    pub fail_apply: Mutex<HashSet<String>>,
    pub fail_delete: Mutex<HashSet<String>>,
    pub panic_on: Mutex<HashSet<String>>,
    pub delay: Mutex<Option<Duration>>,
}

impl Script {
    pub fn calls(&self) -> Vec<(String, ArtifactPhase)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_names(&self, phase: ArtifactPhase) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(_, p)| *p == phase)
            .map(|(n, _)| n)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn fail_apply(&self, name: &str) {
        self.fail_apply.lock().unwrap().insert(name.to_string());
    }

    pub fn heal(&self, name: &str) {
        self.fail_apply.lock().unwrap().remove(name);
        self.fail_delete.lock().unwrap().remove(name);
    }

    pub fn fail_delete(&self, name: &str) {
        self.fail_delete.lock().unwrap().insert(name.to_string());
    }

    pub fn panic_on(&self, name: &str) {
        self.panic_on.lock().unwrap().insert(name.to_string());
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }
}

pub struct ResourceHandler {
    script: Arc<Script>,
}

impl ResourceHandler {
    pub fn new(script: Arc<Script>) -> Self {
        Self { script }
    }
}

impl ArtifactHandler for ResourceHandler {
    fn artifact_type(&self) -> &str {
        "resource"
    }

    fn file_extension(&self) -> Option<&str> {
        Some("res")
    }

    fn parse(&self, location: &str, raw: &[u8], _state: &dyn StateStore) -> ExResult<ArtifactEntity> {
        let text = std::str::from_utf8(raw).map_err(|e| parse_error(location, e.to_string()))?;
        let mut name = None;
        let mut depends = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if line == "invalid" {
                return Err(parse_error(location, "invalid resource definition"));
            } else if let Some(v) = line.strip_prefix("name:") {
                name = Some(v.trim().to_string());
            } else if let Some(v) = line.strip_prefix("depends:") {
                depends.extend(
                    v.split(',')
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(String::from),
                );
            }
        }
        let name = name.ok_or_else(|| parse_error(location, "missing name"))?;
        Ok(ArtifactEntity::new(name.clone())
            .with_key(format!("RESOURCE:{}", name.to_uppercase()))
            .with_depends_on(depends)
            .with_payload(serde_json::json!({ "name": name })))
    }

    fn apply_lifecycle(&self, artifact: &Artifact, phase: ArtifactPhase) -> ExResult<()> {
        let name = artifact.name().to_string();
        self.script.calls.lock().unwrap().push((name.clone(), phase));

        if self.script.panic_on.lock().unwrap().contains(&name) {
            panic!("handler panic for {}", name);
        }
        let delay = *self.script.delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let failing = match phase {
            ArtifactPhase::CreateUpdate => self.script.fail_apply.lock().unwrap().contains(&name),
            ArtifactPhase::Delete => self.script.fail_delete.lock().unwrap().contains(&name),
        };
        if failing {
            return Err(apply_error(artifact.location(), phase, format!("{} refused", name)));
        }
        Ok(())
    }
}

pub fn registry(script: &Arc<Script>) -> SharedRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register(ResourceHandler::new(Arc::clone(script)))
        .unwrap();
    registry.freeze()
}

/// Temporary source root plus a driver over an in-memory store
pub struct Fixture {
    pub root: TempDir,
    pub script: Arc<Script>,
    pub driver: SyncDriver,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_registry(registry)
    }

    pub fn with_registry(build: impl FnOnce(&Arc<Script>) -> SharedRegistry) -> Self {
        let root = tempfile::tempdir().unwrap();
        let script = Arc::new(Script::default());
        let driver = SyncDriver::new(
            vec![root.path().to_path_buf()],
            "tester",
            build(&script),
            Box::new(MemoryStateStore::new()),
        );
        Self {
            root,
            script,
            driver,
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn write(&self, relative: &str, name: &str, depends: &[&str]) -> PathBuf {
        write_resource(self.root(), relative, name, depends)
    }

    pub fn write_raw(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn remove(&self, relative: &str) {
        std::fs::remove_file(self.root().join(relative)).unwrap();
    }

    pub fn state(&self, location: &str) -> Option<artisync_core::ArtifactState> {
        self.driver.with_store(|s| s.get(location).unwrap())
    }

    pub fn all_states(&self) -> Vec<artisync_core::ArtifactState> {
        self.driver.with_store(|s| s.list_all().unwrap())
    }
}

pub fn write_resource(root: &Path, relative: &str, name: &str, depends: &[&str]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut content = format!("name: {}\n", name);
    if !depends.is_empty() {
        content.push_str(&format!("depends: {}\n", depends.join(", ")));
    }
    std::fs::write(&path, content).unwrap();
    path
}
