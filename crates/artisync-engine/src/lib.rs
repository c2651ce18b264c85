//! artisync engine - synchronization orchestration
//!
//! Wires the core reconciliation kernel to the filesystem and the SQLite
//! store: configuration, source scanning, the pass driver, and the
//! single-flight scheduler.

pub mod config;
pub mod driver;
pub mod scanner;
pub mod scheduler;

pub use config::SyncConfig;
pub use driver::SyncDriver;
pub use scheduler::{Scheduler, SchedulerStatus, TriggerOutcome};
