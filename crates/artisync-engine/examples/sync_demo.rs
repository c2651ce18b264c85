//! Synchronization pass demonstration
#![allow(clippy::unwrap_used, clippy::expect_used)]
//!
//! Registers a toy handler for `.role` files, then walks through:
//! 1. A first pass applying roles in dependency order
//! 2. A no-op pass over unchanged sources
//! 3. A pass after one source was removed

use artisync_core::errors::{parse_error, ExResult};
use artisync_core::logging_facility::{init, Profile};
use artisync_core::state::{MemoryStateStore, StateStore};
use artisync_core::{Artifact, ArtifactEntity, ArtifactHandler, ArtifactPhase, HandlerRegistry};
use artisync_engine::SyncDriver;

/// `.role` files: first line is the role name, `inherits:` lines name parents
struct RoleHandler;

impl ArtifactHandler for RoleHandler {
    fn artifact_type(&self) -> &str {
        "role"
    }

    fn file_extension(&self) -> Option<&str> {
        Some("role")
    }

    fn parse(&self, location: &str, raw: &[u8], _state: &dyn StateStore) -> ExResult<ArtifactEntity> {
        let text = String::from_utf8_lossy(raw);
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let name = lines
            .next()
            .ok_or_else(|| parse_error(location, "empty role file"))?;
        let parents: Vec<String> = lines
            .filter_map(|l| l.strip_prefix("inherits:"))
            .map(|p| p.trim().to_string())
            .collect();
        Ok(ArtifactEntity::new(name).with_depends_on(parents))
    }

    fn apply_lifecycle(&self, artifact: &Artifact, phase: ArtifactPhase) -> ExResult<()> {
        println!("  -> {} {}", phase, artifact.name());
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init(Profile::Development);
    println!("=== artisync Sync Demo ===\n");

    let root = tempfile::tempdir()?;
    std::fs::write(root.path().join("admin.role"), "admin\ninherits: editor\n")?;
    std::fs::write(root.path().join("editor.role"), "editor\ninherits: viewer\n")?;
    std::fs::write(root.path().join("viewer.role"), "viewer\n")?;

    let mut registry = HandlerRegistry::new();
    registry.register(RoleHandler)?;
    let driver = SyncDriver::new(
        vec![root.path().to_path_buf()],
        "demo",
        registry.freeze(),
        Box::new(MemoryStateStore::new()),
    );

    println!("## Pass 1: everything is new\n");
    let report = driver.run_pass();
    println!("status: {}, succeeded: {:?}\n", report.status, report.succeeded);

    println!("## Pass 2: nothing changed\n");
    let report = driver.run_pass();
    println!("status: {}, unchanged: {}\n", report.status, report.unchanged);

    println!("## Pass 3: admin.role removed\n");
    std::fs::remove_file(root.path().join("admin.role"))?;
    let report = driver.run_pass();
    println!("status: {}, deleted: {:?}\n", report.status, report.deleted);

    println!("## Persisted state\n");
    for state in driver.with_store(|s| s.list_all())? {
        println!("  {:<26} {}", state.lifecycle, state.location);
    }
    Ok(())
}
