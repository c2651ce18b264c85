//! Synchronization driver
//!
//! One pass: scan, parse, resolve, deplete, clean up removed sources, and
//! report. Handler and per-artifact store failures are contained in the
//! pass report; nothing here panics or returns early on them.

use crate::config::SyncConfig;
use crate::scanner::{scan_roots, ScanOutcome};
use artisync_core::errors::{ExError, ExErrorKind, SyncError};
use artisync_core::graph::{build_graph, resolve};
use artisync_core::handler::{ArtifactHandler, SharedRegistry};
use artisync_core::model::{
    Artifact, ArtifactDeclaration, ArtifactEntity, ArtifactLifecycle, ArtifactPhase,
    ArtifactState, PassReport, SourceFile,
};
use artisync_core::state::StateStore;
use artisync_core::{deplete, log_artifact_failure, log_op_end, log_op_error, log_op_start};
use artisync_core_types::schema::OP_SYNC_PASS;
use artisync_core_types::{PassContext, TriggerSource};
use artisync_store::SqliteStateStore;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

type BoxedStore = Box<dyn StateStore + Send>;

/// A parsed artifact waiting for its CREATE_UPDATE
struct Candidate {
    source: SourceFile,
    entity: ArtifactEntity,
    state: ArtifactState,
}

pub struct SyncDriver {
    roots: Vec<PathBuf>,
    actor: String,
    registry: SharedRegistry,
    store: Mutex<BoxedStore>,
}

impl SyncDriver {
    pub fn new(
        roots: Vec<PathBuf>,
        actor: impl Into<String>,
        registry: SharedRegistry,
        store: BoxedStore,
    ) -> Self {
        Self {
            roots,
            actor: actor.into(),
            registry,
            store: Mutex::new(store),
        }
    }

    /// Driver over the SQLite store at `config.db_path`
    ///
    /// # Errors
    ///
    /// Fails if the database cannot be opened or migrated.
    pub fn from_config(config: &SyncConfig, registry: SharedRegistry) -> Result<Self, ExError> {
        let store = SqliteStateStore::open(&config.db_path)?;
        Ok(Self::new(
            config.source_roots.clone(),
            config.actor.clone(),
            registry,
            Box::new(store),
        ))
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Run `f` against the state store between passes
    pub fn with_store<R>(&self, f: impl FnOnce(&mut dyn StateStore) -> R) -> R {
        let mut store = self.lock_store();
        f(&mut **store)
    }

    /// Run one pass outside the scheduler
    pub fn run_pass(&self) -> PassReport {
        self.run_pass_with(PassContext::new(TriggerSource::Direct))
    }

    /// Run one pass with the given correlation context
    pub fn run_pass_with(&self, ctx: PassContext) -> PassReport {
        let started = Instant::now();
        log_op_start!(OP_SYNC_PASS, pass_id = %ctx.pass_id, trigger = %ctx.trigger);

        let mut store = self.lock_store();
        let mut pass = Pass {
            actor: &self.actor,
            registry: &self.registry,
            store: &mut **store,
            report: PassReport::new(&ctx),
        };
        pass.run(&self.roots);

        let report = pass.report.finish();
        if let Err(e) = pass.store.record_pass(&report.summary()) {
            tracing::error!(pass_id = %report.pass_id, err_code = e.code(), "failed to record pass: {}", e);
        }
        drop(store);

        let duration_ms = started.elapsed().as_millis() as u64;
        if let Some(members) = &report.cycle {
            log_op_error!(
                OP_SYNC_PASS,
                SyncError::CyclicDependency {
                    members: members.clone()
                },
                duration_ms = duration_ms,
                pass_id = %report.pass_id
            );
        } else {
            log_op_end!(
                OP_SYNC_PASS,
                duration_ms = duration_ms,
                pass_id = %report.pass_id,
                status = %report.status,
                scanned = report.scanned,
                unchanged = report.unchanged,
                succeeded = report.succeeded.len(),
                failed = report.failed.len(),
                blocked = report.blocked.len(),
                deleted = report.deleted.len()
            );
        }
        report
    }

    fn lock_store(&self) -> MutexGuard<'_, BoxedStore> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // Every write is committed on its own, so a pass that
                // panicked mid-way leaves the store usable.
                let err = ExError::new(ExErrorKind::Concurrency)
                    .with_op("lock_store")
                    .with_message("state store lock poisoned by a panicked pass");
                tracing::warn!(err_kind = ?err.kind(), err_code = err.code(), "{}", err);
                self.store.clear_poison();
                poisoned.into_inner()
            }
        }
    }
}

/// State of one pass in flight
struct Pass<'a> {
    actor: &'a str,
    registry: &'a SharedRegistry,
    store: &'a mut (dyn StateStore + Send),
    report: PassReport,
}

impl<'a> Pass<'a> {
    fn run(&mut self, roots: &[PathBuf]) {
        let scan = match scan_roots(roots, self.registry) {
            Ok(scan) => scan,
            Err(e) => {
                tracing::error!(err_code = e.code(), "scan aborted: {}", e);
                self.report.abort_scan(e.to_string());
                return;
            }
        };
        self.report.scanned = scan.files.len() + scan.unreadable.len();
        for duplicate in &scan.duplicates {
            self.report.record_error(duplicate.to_string());
        }
        let seen = scan.seen_locations();

        let candidates = self.parse_all(scan);
        if !self.create_update(candidates) {
            return;
        }
        self.cleanup(&seen);
        self.report_unregistered();
    }

    /// Parse changed sources; unchanged successful ones are skipped entirely
    fn parse_all(&mut self, scan: ScanOutcome) -> Vec<Candidate> {
        for unreadable in scan.unreadable {
            let Some(handler) = self.handler(&unreadable.artifact_type) else {
                continue;
            };
            let Some(mut state) = self.load_or_discover(&handler, &unreadable.location, &unreadable.artifact_type) else {
                continue;
            };
            let message = format!("cannot read source: {}", unreadable.message);
            state.fail(ArtifactLifecycle::FailedCreateUpdate, message.clone(), self.actor);
            self.record(&handler, &state);
            self.report
                .record_failure(unreadable.location, ArtifactPhase::CreateUpdate, message);
        }

        let mut candidates = Vec::new();
        for source in scan.files {
            let Some(handler) = self.handler(&source.artifact_type) else {
                continue;
            };
            let Some(mut state) = self.load_or_discover(&handler, &source.location, &source.artifact_type) else {
                continue;
            };

            if state.is_up_to_date(&source.fingerprint) {
                self.report.unchanged += 1;
                continue;
            }

            match handler.parse(&source.location, source.raw_content.expose(), &*self.store) {
                Ok(entity) => candidates.push(Candidate {
                    source,
                    entity,
                    state,
                }),
                Err(e) => {
                    log_artifact_failure!(
                        ArtifactPhase::CreateUpdate,
                        source.location,
                        &e,
                        pass_id = %self.report.pass_id
                    );
                    state.fail(ArtifactLifecycle::FailedCreateUpdate, e.to_string(), self.actor);
                    self.record(&handler, &state);
                    self.report
                        .record_failure(source.location, ArtifactPhase::CreateUpdate, e.to_string());
                }
            }
        }
        candidates
    }

    /// Resolve and apply CREATE_UPDATE; false if the pass was aborted
    fn create_update(&mut self, candidates: Vec<Candidate>) -> bool {
        let started = Instant::now();
        let declarations: Vec<ArtifactDeclaration> = candidates
            .iter()
            .map(|c| ArtifactDeclaration::from_parsed(&c.source, &c.entity))
            .collect();
        let mut graph = build_graph(declarations);

        log_op_start!("resolve", pass_id = %self.report.pass_id, artifacts = graph.len());
        let resolution = match resolve(&graph) {
            Ok(resolution) => resolution,
            Err(SyncError::CyclicDependency { members }) => {
                self.report.abort_cycle(members);
                return false;
            }
            Err(other) => {
                self.report.record_error(other.to_string());
                return false;
            }
        };
        log_op_end!(
            "resolve",
            duration_ms = started.elapsed().as_millis() as u64,
            pass_id = %self.report.pass_id,
            external = resolution.external_dependencies.len()
        );
        self.report.external_dependencies = resolution.external_dependencies.clone();

        let mut pending: HashMap<String, (Candidate, Arc<dyn ArtifactHandler>)> = HashMap::new();
        for mut candidate in candidates {
            let Some(handler) = self.handler(&candidate.source.artifact_type) else {
                continue;
            };
            let lifecycle = if candidate.state.fingerprint.is_some() {
                ArtifactLifecycle::Updated
            } else {
                ArtifactLifecycle::Created
            };
            candidate.state.transition(lifecycle, self.actor);
            self.record(&handler, &candidate.state);
            pending.insert(candidate.source.location.clone(), (candidate, handler));
        }

        let started = Instant::now();
        log_op_start!("deplete", pass_id = %self.report.pass_id, artifacts = pending.len());
        let pass_id = self.report.pass_id.to_string();
        let actor = self.actor;
        let store = &mut *self.store;
        let depletion = deplete(&mut graph, &resolution.order, |declaration| {
            let Some((candidate, handler)) = pending.get_mut(&declaration.location) else {
                return Ok(());
            };
            let artifact = Artifact::new(declaration.clone(), candidate.entity.clone());
            let applied = handler.apply_lifecycle(&artifact, ArtifactPhase::CreateUpdate);
            let state = &mut candidate.state;
            match applied {
                Ok(()) => {
                    // Stored fields describe what was last applied, not what was parsed
                    state.absorb_entity(&candidate.entity);
                    state.fingerprint = Some(candidate.source.fingerprint.clone());
                    state.transition(ArtifactLifecycle::SuccessfulCreateUpdate, actor);
                    handler.record_state(&mut *store, state)
                }
                Err(e) => {
                    log_artifact_failure!(
                        ArtifactPhase::CreateUpdate,
                        state.location,
                        &e,
                        pass_id = %pass_id
                    );
                    state.fail(ArtifactLifecycle::FailedCreateUpdate, e.to_string(), actor);
                    if let Err(record_err) = handler.record_state(&mut *store, state) {
                        tracing::error!(location = %state.location, "failed to record failure: {}", record_err);
                    }
                    Err(e)
                }
            }
        });
        log_op_end!(
            "deplete",
            duration_ms = started.elapsed().as_millis() as u64,
            pass_id = %pass_id,
            rounds = depletion.rounds,
            succeeded = depletion.succeeded.len(),
            failed = depletion.failed.len(),
            blocked = depletion.still_blocked.len()
        );

        for failure in depletion.failed {
            self.report.record_failure(
                failure.location,
                ArtifactPhase::CreateUpdate,
                failure.error.to_string(),
            );
        }
        for blocked in depletion.still_blocked {
            if let Some((candidate, handler)) = pending.get_mut(&blocked.location) {
                let message = format!(
                    "blocked by unresolved dependencies: {}",
                    blocked.missing.join(", ")
                );
                let lifecycle = candidate.state.lifecycle;
                candidate.state.fail(lifecycle, message, self.actor);
                self.record(handler, &candidate.state);
            }
            self.report.record_blocked(blocked.location, blocked.missing);
        }
        self.report.succeeded = depletion.succeeded;
        true
    }

    /// Decommission artifacts whose sources disappeared, dependents first
    fn cleanup(&mut self, seen: &HashSet<String>) {
        let started = Instant::now();
        log_op_start!("cleanup", pass_id = %self.report.pass_id);

        let mut removed: Vec<(Artifact, Arc<dyn ArtifactHandler>)> = Vec::new();
        let handlers: Vec<(String, Arc<dyn ArtifactHandler>)> = self
            .registry
            .handlers()
            .map(|(ty, h)| (ty.to_string(), Arc::clone(h)))
            .collect();
        for (artifact_type, handler) in handlers {
            match handler.retrieve_existing(&artifact_type, "/", &*self.store) {
                Ok(existing) => removed.extend(
                    existing
                        .into_iter()
                        .filter(|a| !seen.contains(a.location()))
                        .map(|a| (a, Arc::clone(&handler))),
                ),
                Err(e) => self.report.record_error(format!(
                    "cannot list existing {} artifacts: {}",
                    artifact_type, e
                )),
            }
        }

        for location in deletion_order(&removed) {
            let Some((artifact, handler)) = removed.iter().find(|(a, _)| a.location() == location)
            else {
                continue;
            };
            self.decommission(artifact, handler);
        }

        log_op_end!(
            "cleanup",
            duration_ms = started.elapsed().as_millis() as u64,
            pass_id = %self.report.pass_id,
            deleted = self.report.deleted.len()
        );
    }

    fn decommission(&mut self, artifact: &Artifact, handler: &Arc<dyn ArtifactHandler>) {
        let location = artifact.location().to_string();
        let mut state = match self.store.get(&location) {
            Ok(Some(state)) => state,
            Ok(None) => return,
            Err(e) => {
                self.report
                    .record_failure(location, ArtifactPhase::Delete, e.to_string());
                return;
            }
        };

        // Never applied, so there is nothing live to take down.
        if state.fingerprint.is_none() {
            self.remove(&location);
            return;
        }

        state.transition(ArtifactLifecycle::MissingFromSource, self.actor);
        if !self.record(handler, &state) {
            return;
        }

        match handler.apply_lifecycle(artifact, ArtifactPhase::Delete) {
            Ok(()) => {
                state.transition(ArtifactLifecycle::SuccessfulDelete, self.actor);
                if self.record(handler, &state) {
                    self.remove(&location);
                }
            }
            Err(e) => {
                log_artifact_failure!(
                    ArtifactPhase::Delete,
                    location,
                    &e,
                    pass_id = %self.report.pass_id
                );
                state.fail(ArtifactLifecycle::FailedDelete, e.to_string(), self.actor);
                self.record(handler, &state);
                self.report
                    .record_failure(location, ArtifactPhase::Delete, e.to_string());
            }
        }
    }

    fn remove(&mut self, location: &str) {
        match self.store.remove(location) {
            Ok(_) => self.report.deleted.push(location.to_string()),
            Err(e) => self
                .report
                .record_failure(location, ArtifactPhase::Delete, e.to_string()),
        }
    }

    /// Rows whose type no handler owns are left alone but reported
    fn report_unregistered(&mut self) {
        let rows = match self.store.list_all() {
            Ok(rows) => rows,
            Err(e) => {
                self.report
                    .record_error(format!("cannot list artifact state: {}", e));
                return;
            }
        };
        for row in rows {
            if self.registry.get(&row.artifact_type).is_none() {
                self.report.record_error(
                    SyncError::HandlerNotRegistered {
                        artifact_type: row.artifact_type.clone(),
                    }
                    .to_string()
                        + &format!(" (location {})", row.location),
                );
            }
        }
    }

    fn handler(&mut self, artifact_type: &str) -> Option<Arc<dyn ArtifactHandler>> {
        let handler = self.registry.get(artifact_type).cloned();
        if handler.is_none() {
            self.report.record_error(
                SyncError::HandlerNotRegistered {
                    artifact_type: artifact_type.to_string(),
                }
                .to_string(),
            );
        }
        handler
    }

    /// Existing state, or a freshly persisted DISCOVERED row
    fn load_or_discover(
        &mut self,
        handler: &Arc<dyn ArtifactHandler>,
        location: &str,
        artifact_type: &str,
    ) -> Option<ArtifactState> {
        match self.store.get(location) {
            Ok(Some(state)) => Some(state),
            Ok(None) => {
                let state = ArtifactState::discovered(location, artifact_type, self.actor);
                self.record(handler, &state).then_some(state)
            }
            Err(e) => {
                self.report
                    .record_failure(location, ArtifactPhase::CreateUpdate, e.to_string());
                None
            }
        }
    }

    /// Persist through the handler; false (and reported) on failure
    fn record(&mut self, handler: &Arc<dyn ArtifactHandler>, state: &ArtifactState) -> bool {
        match handler.record_state(&mut *self.store, state) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(location = %state.location, err_code = e.code(), "state write failed: {}", e);
                self.report
                    .record_error(format!("{}: state write failed: {}", state.location, e));
                false
            }
        }
    }
}

/// Reverse dependency order over the removed set
fn deletion_order(removed: &[(Artifact, Arc<dyn ArtifactHandler>)]) -> Vec<String> {
    let graph = build_graph(removed.iter().map(|(a, _)| a.declaration.clone()).collect());
    let mut order = match resolve(&graph) {
        Ok(resolution) => resolution.order,
        Err(e) => {
            tracing::warn!("removed artifacts form a cycle, deleting by location: {}", e);
            graph.nodes().map(|n| n.location().to_string()).collect()
        }
    };
    order.reverse();
    order
}
