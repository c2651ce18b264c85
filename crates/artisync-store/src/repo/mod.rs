//! Repository layer persisting artifact state and pass history to SQLite

pub mod pass_ledger;
pub mod state_repo;

pub use pass_ledger::PassLedger;
pub use state_repo::SqliteStateStore;
