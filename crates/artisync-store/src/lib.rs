//! artisync store - SQLite persistence for artifact lifecycle state
//!
//! Provides:
//! - Connection helpers
//! - Checksummed, idempotent embedded migrations
//! - `SqliteStateStore`, the durable `StateStore` implementation
//! - Pass ledger persistence

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use errors::Result;
pub use repo::SqliteStateStore;
