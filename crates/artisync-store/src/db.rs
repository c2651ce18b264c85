//! Database connection management

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, io_error, Result};
use crate::migrations::apply_migrations;
use rusqlite::Connection;
use std::path::Path;

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Configure a connection with optimal settings
pub fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(from_rusqlite)?;

    // WAL lets the CLI read while a pass writes. `journal_mode` returns a row,
    // so it cannot go through `execute`.
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
        .map_err(from_rusqlite)?;

    Ok(())
}

/// Open, configure and migrate the database at `path`, creating parent directories
pub fn open_migrated<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_error("create_db_dir", e))?;
        }
    }
    let mut conn = open(path)?;
    configure(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}
