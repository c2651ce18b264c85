//! Pass scheduler
//!
//! Runs the driver periodically and on demand, never more than one pass at
//! a time. Each pass runs on the blocking pool under a timeout. A timed-out
//! pass is abandoned by the caller but keeps the in-progress flag until it
//! really finishes, so passes never overlap.

use crate::config::SyncConfig;
use crate::driver::SyncDriver;
use artisync_core::errors::SyncError;
use artisync_core::model::PassReport;
use artisync_core_types::schema::{EVENT_SKIPPED, OP_SYNC_PASS};
use artisync_core_types::{PassContext, TriggerSource};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What a trigger led to
#[derive(Debug)]
pub enum TriggerOutcome {
    /// The pass ran to the end (it may still report artifact failures)
    Completed(Box<PassReport>),
    /// Another pass was in flight; nothing was queued
    AlreadyRunning,
    /// The scheduler is switched off
    Disabled,
    /// The pass exceeded its budget and was abandoned by the caller
    TimedOut { elapsed_ms: u64 },
    /// The pass task died (handler panic)
    Failed { message: String },
}

/// Health snapshot
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub enabled: bool,
    pub in_progress: bool,
    pub successful_passes: u64,
    pub failed_passes: u64,
    pub timed_out_passes: u64,
    pub skipped_triggers: u64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_report: Option<PassReport>,
}

#[derive(Debug, Default)]
struct SchedulerState {
    enabled: AtomicBool,
    in_progress: AtomicBool,
    successful_passes: AtomicU64,
    failed_passes: AtomicU64,
    timed_out_passes: AtomicU64,
    skipped_triggers: AtomicU64,
    last: Mutex<LastPass>,
}

#[derive(Debug, Default)]
struct LastPass {
    success_at: Option<DateTime<Utc>>,
    report: Option<PassReport>,
}

impl SchedulerState {
    fn record_report(&self, report: &PassReport) {
        if report.status.is_aborted() {
            self.failed_passes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.successful_passes.fetch_add(1, Ordering::Relaxed);
        }
        if let Ok(mut last) = self.last.lock() {
            if !report.status.is_aborted() {
                last.success_at = report.finished_at;
            }
            last.report = Some(report.clone());
        }
    }
}

/// Clears the in-progress flag when the pass really ends, even by panic
struct InProgressGuard(Arc<SchedulerState>);

impl Drop for InProgressGuard {
    fn drop(&mut self) {
        self.0.in_progress.store(false, Ordering::Release);
    }
}

struct Inner {
    driver: Arc<SyncDriver>,
    state: Arc<SchedulerState>,
    pass_timeout: Duration,
}

impl Inner {
    async fn trigger(&self, source: TriggerSource) -> TriggerOutcome {
        if !self.state.enabled.load(Ordering::Acquire) {
            self.state.skipped_triggers.fetch_add(1, Ordering::Relaxed);
            tracing::info!(op = OP_SYNC_PASS, event = EVENT_SKIPPED, trigger = %source, "synchronization disabled, trigger skipped");
            return TriggerOutcome::Disabled;
        }

        if self
            .state
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.state.skipped_triggers.fetch_add(1, Ordering::Relaxed);
            tracing::info!(op = OP_SYNC_PASS, event = EVENT_SKIPPED, trigger = %source, "pass already running, trigger skipped");
            return TriggerOutcome::AlreadyRunning;
        }

        let guard = InProgressGuard(Arc::clone(&self.state));
        let driver = Arc::clone(&self.driver);
        let ctx = PassContext::new(source);
        let started = Instant::now();
        let task = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            driver.run_pass_with(ctx)
        });

        match tokio::time::timeout(self.pass_timeout, task).await {
            Ok(Ok(report)) => {
                self.state.record_report(&report);
                TriggerOutcome::Completed(Box::new(report))
            }
            Ok(Err(join_err)) => {
                self.state.failed_passes.fetch_add(1, Ordering::Relaxed);
                tracing::error!(trigger = %source, "pass task failed: {}", join_err);
                TriggerOutcome::Failed {
                    message: join_err.to_string(),
                }
            }
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                self.state.timed_out_passes.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    trigger = %source,
                    err_code = artisync_core::ExErrorKind::Timeout.code(),
                    "{}",
                    SyncError::Timeout { elapsed_ms }
                );
                TriggerOutcome::TimedOut { elapsed_ms }
            }
        }
    }
}

pub struct Scheduler {
    inner: Arc<Inner>,
    interval: Duration,
    shutdown_tx: watch::Sender<bool>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(driver: Arc<SyncDriver>, config: &SyncConfig) -> Self {
        let scheduler = Self::with_timing(driver, config.sync_interval, config.pass_timeout);
        scheduler.set_enabled(config.sync_enabled);
        scheduler
    }

    pub fn with_timing(driver: Arc<SyncDriver>, interval: Duration, pass_timeout: Duration) -> Self {
        let state = SchedulerState::default();
        state.enabled.store(true, Ordering::Release);
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                driver,
                state: Arc::new(state),
                pass_timeout,
            }),
            interval,
            shutdown_tx,
            loop_handle: Mutex::new(None),
        }
    }

    /// Start the periodic loop; the first pass runs immediately
    ///
    /// Calling it again while the loop runs does nothing. Must be called
    /// from within a tokio runtime.
    pub fn start(&self) {
        let Ok(mut handle) = self.loop_handle.lock() else {
            return;
        };
        if handle.is_some() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let period = self.interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tracing::info!(interval_secs = period.as_secs(), "scheduler started");

        *handle = Some(tokio::spawn(async move {
            let mut timer = tokio::time::interval(period);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        inner.trigger(TriggerSource::Periodic).await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("scheduler stopped");
        }));
    }

    /// Run a pass now, subject to the same single-flight rule
    pub async fn force_now(&self) -> TriggerOutcome {
        self.inner.trigger(TriggerSource::Forced).await
    }

    /// Stop the periodic loop, waiting for a trigger in flight to return
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self.loop_handle.lock().ok().and_then(|mut h| h.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!("scheduler loop ended abnormally: {}", e);
            }
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.state.enabled.store(enabled, Ordering::Release);
        tracing::info!(enabled, "synchronization switch changed");
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.state.enabled.load(Ordering::Acquire)
    }

    pub fn is_running_pass(&self) -> bool {
        self.inner.state.in_progress.load(Ordering::Acquire)
    }

    pub fn driver(&self) -> &Arc<SyncDriver> {
        &self.inner.driver
    }

    pub fn status(&self) -> SchedulerStatus {
        let state = &self.inner.state;
        let (last_success_at, last_report) = state
            .last
            .lock()
            .map(|l| (l.success_at, l.report.clone()))
            .unwrap_or((None, None));
        SchedulerStatus {
            enabled: state.enabled.load(Ordering::Acquire),
            in_progress: state.in_progress.load(Ordering::Acquire),
            successful_passes: state.successful_passes.load(Ordering::Acquire),
            failed_passes: state.failed_passes.load(Ordering::Acquire),
            timed_out_passes: state.timed_out_passes.load(Ordering::Acquire),
            skipped_triggers: state.skipped_triggers.load(Ordering::Acquire),
            last_success_at,
            last_report,
        }
    }
}
