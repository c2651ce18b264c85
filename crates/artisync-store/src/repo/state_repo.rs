//! SQLite-backed lifecycle state store
//!
//! Every write runs in its own transaction, so a crash mid-pass leaves all
//! previously written rows intact and consistent.

#![allow(clippy::result_large_err)]

use crate::db;
use crate::errors::{decode_error, from_rusqlite, Result};
use crate::repo::pass_ledger::PassLedger;
use artisync_core::errors::ExResult;
use artisync_core::model::{ArtifactLifecycle, ArtifactState, PassSummary};
use artisync_core::state::StateStore;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;

const SELECT_COLUMNS: &str = "SELECT location, name, artifact_type, natural_key, fingerprint,
        lifecycle, error, depends_on, payload, created_by, created_at, updated_by, updated_at
     FROM artifact_state";

/// Durable `StateStore` over one SQLite connection
pub struct SqliteStateStore {
    conn: Connection,
}

impl SqliteStateStore {
    /// Open (and migrate) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            conn: db::open_migrated(path)?,
        })
    }

    /// Fresh migrated in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = db::open_in_memory()?;
        crate::migrations::apply_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    /// Wrap a connection that has already been migrated
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn query_states(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<ArtifactState>> {
        let mut stmt = self.conn.prepare(sql).map_err(from_rusqlite)?;
        let raw = stmt
            .query_map(params, RawState::from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        raw.into_iter().map(RawState::into_state).collect()
    }
}

impl StateStore for SqliteStateStore {
    fn get(&self, location: &str) -> ExResult<Option<ArtifactState>> {
        let raw = self
            .conn
            .query_row(
                &format!("{} WHERE location = ?1", SELECT_COLUMNS),
                [location],
                RawState::from_row,
            )
            .optional()
            .map_err(from_rusqlite)?;
        raw.map(RawState::into_state).transpose()
    }

    fn upsert(&mut self, state: &ArtifactState) -> ExResult<()> {
        let depends_on = serde_json::to_string(&state.depends_on)
            .map_err(|e| decode_error(&state.location, "depends_on", e))?;
        let payload = serde_json::to_string(&state.payload)
            .map_err(|e| decode_error(&state.location, "payload", e))?;

        let tx = self.conn.transaction().map_err(from_rusqlite)?;
        tx.execute(
            "INSERT INTO artifact_state (location, name, artifact_type, natural_key, fingerprint,
                lifecycle, error, depends_on, payload, created_by, created_at, updated_by, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(location) DO UPDATE SET
                name = excluded.name,
                artifact_type = excluded.artifact_type,
                natural_key = excluded.natural_key,
                fingerprint = excluded.fingerprint,
                lifecycle = excluded.lifecycle,
                error = excluded.error,
                depends_on = excluded.depends_on,
                payload = excluded.payload,
                updated_by = excluded.updated_by,
                updated_at = excluded.updated_at",
            rusqlite::params![
                state.location,
                state.name,
                state.artifact_type,
                state.natural_key,
                state.fingerprint,
                state.lifecycle.as_str(),
                state.error,
                depends_on,
                payload,
                state.created_by,
                state.created_at.timestamp_millis(),
                state.updated_by,
                state.updated_at.timestamp_millis(),
            ],
        )
        .map_err(from_rusqlite)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(())
    }

    fn remove(&mut self, location: &str) -> ExResult<bool> {
        let tx = self.conn.transaction().map_err(from_rusqlite)?;
        let removed = tx
            .execute("DELETE FROM artifact_state WHERE location = ?1", [location])
            .map_err(from_rusqlite)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(removed > 0)
    }

    fn list_all(&self) -> ExResult<Vec<ArtifactState>> {
        self.query_states(&format!("{} ORDER BY location", SELECT_COLUMNS), &[])
    }

    fn list_by_type(&self, artifact_type: &str) -> ExResult<Vec<ArtifactState>> {
        self.query_states(
            &format!("{} WHERE artifact_type = ?1 ORDER BY location", SELECT_COLUMNS),
            &[&artifact_type],
        )
    }

    fn list_by_lifecycle(&self, lifecycle: ArtifactLifecycle) -> ExResult<Vec<ArtifactState>> {
        self.query_states(
            &format!("{} WHERE lifecycle = ?1 ORDER BY location", SELECT_COLUMNS),
            &[&lifecycle.as_str()],
        )
    }

    fn find_by_key(&self, artifact_type: &str, key: &str) -> ExResult<Option<ArtifactState>> {
        let mut found = self.query_states(
            &format!(
                "{} WHERE artifact_type = ?1 AND natural_key = ?2 ORDER BY location LIMIT 1",
                SELECT_COLUMNS
            ),
            &[&artifact_type, &key],
        )?;
        Ok(found.pop())
    }

    fn record_pass(&mut self, summary: &PassSummary) -> ExResult<()> {
        PassLedger::record(&mut self.conn, summary)
    }

    fn recent_passes(&self, limit: usize) -> ExResult<Vec<PassSummary>> {
        PassLedger::recent(&self.conn, limit)
    }
}

/// Row as stored, before enum and JSON decoding
struct RawState {
    location: String,
    name: String,
    artifact_type: String,
    natural_key: Option<String>,
    fingerprint: Option<String>,
    lifecycle: String,
    error: Option<String>,
    depends_on: String,
    payload: String,
    created_by: String,
    created_at: i64,
    updated_by: String,
    updated_at: i64,
}

impl RawState {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            location: row.get(0)?,
            name: row.get(1)?,
            artifact_type: row.get(2)?,
            natural_key: row.get(3)?,
            fingerprint: row.get(4)?,
            lifecycle: row.get(5)?,
            error: row.get(6)?,
            depends_on: row.get(7)?,
            payload: row.get(8)?,
            created_by: row.get(9)?,
            created_at: row.get(10)?,
            updated_by: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    fn into_state(self) -> Result<ArtifactState> {
        let lifecycle: ArtifactLifecycle = self
            .lifecycle
            .parse()
            .map_err(|e| decode_error(&self.location, "lifecycle", e))?;
        let depends_on: Vec<String> = serde_json::from_str(&self.depends_on)
            .map_err(|e| decode_error(&self.location, "depends_on", e))?;
        let payload: serde_json::Value = serde_json::from_str(&self.payload)
            .map_err(|e| decode_error(&self.location, "payload", e))?;
        let created_at = from_millis(&self.location, "created_at", self.created_at)?;
        let updated_at = from_millis(&self.location, "updated_at", self.updated_at)?;

        Ok(ArtifactState {
            location: self.location,
            name: self.name,
            artifact_type: self.artifact_type,
            natural_key: self.natural_key,
            lifecycle,
            error: self.error,
            fingerprint: self.fingerprint,
            depends_on,
            payload,
            created_by: self.created_by,
            created_at,
            updated_by: self.updated_by,
            updated_at,
        })
    }
}

pub(crate) fn from_millis(location: &str, column: &str, ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| decode_error(location, column, format!("timestamp out of range: {}", ms)))
}
