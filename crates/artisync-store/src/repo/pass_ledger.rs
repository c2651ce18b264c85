//! Pass ledger persistence
//!
//! Append-only history of pass summaries in `sync_passes`.

#![allow(clippy::result_large_err)]

use crate::errors::{decode_error, from_rusqlite, Result};
use crate::repo::state_repo::from_millis;
use artisync_core::model::{PassStatus, PassSummary};
use artisync_core_types::{PassId, TriggerSource};
use rusqlite::{Connection, OptionalExtension, Row};

pub struct PassLedger;

impl PassLedger {
    /// Append one pass summary
    pub fn record(conn: &mut Connection, summary: &PassSummary) -> Result<()> {
        let errors = serde_json::to_string(&summary.errors)
            .map_err(|e| decode_error(summary.pass_id.as_str(), "errors", e))?;

        let tx = conn.transaction().map_err(from_rusqlite)?;
        tx.execute(
            "INSERT INTO sync_passes (pass_id, trigger, started_at, finished_at, status,
                scanned, unchanged, succeeded, failed, blocked, deleted, errors)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                summary.pass_id.as_str(),
                summary.trigger.as_str(),
                summary.started_at.timestamp_millis(),
                summary.finished_at.timestamp_millis(),
                summary.status.as_str(),
                summary.scanned as i64,
                summary.unchanged as i64,
                summary.succeeded as i64,
                summary.failed as i64,
                summary.blocked as i64,
                summary.deleted as i64,
                errors,
            ],
        )
        .map_err(from_rusqlite)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(())
    }

    /// Most recent passes, newest first
    pub fn recent(conn: &Connection, limit: usize) -> Result<Vec<PassSummary>> {
        let mut stmt = conn
            .prepare(
                "SELECT pass_id, trigger, started_at, finished_at, status, scanned, unchanged,
                        succeeded, failed, blocked, deleted, errors
                 FROM sync_passes
                 ORDER BY started_at DESC, pass_id DESC
                 LIMIT ?1",
            )
            .map_err(from_rusqlite)?;
        let raw = stmt
            .query_map([limit as i64], RawPass::from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        raw.into_iter().map(RawPass::into_summary).collect()
    }

    /// One pass by id
    pub fn get(conn: &Connection, pass_id: &PassId) -> Result<Option<PassSummary>> {
        let raw = conn
            .query_row(
                "SELECT pass_id, trigger, started_at, finished_at, status, scanned, unchanged,
                        succeeded, failed, blocked, deleted, errors
                 FROM sync_passes WHERE pass_id = ?1",
                [pass_id.as_str()],
                RawPass::from_row,
            )
            .optional()
            .map_err(from_rusqlite)?;
        raw.map(RawPass::into_summary).transpose()
    }
}

struct RawPass {
    pass_id: String,
    trigger: String,
    started_at: i64,
    finished_at: i64,
    status: String,
    counts: [i64; 6],
    errors: String,
}

impl RawPass {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            pass_id: row.get(0)?,
            trigger: row.get(1)?,
            started_at: row.get(2)?,
            finished_at: row.get(3)?,
            status: row.get(4)?,
            counts: [
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
                row.get(9)?,
                row.get(10)?,
            ],
            errors: row.get(11)?,
        })
    }

    fn into_summary(self) -> Result<PassSummary> {
        let trigger = match self.trigger.as_str() {
            "periodic" => TriggerSource::Periodic,
            "forced" => TriggerSource::Forced,
            "direct" => TriggerSource::Direct,
            other => return Err(decode_error(&self.pass_id, "trigger", other)),
        };
        let status: PassStatus = self
            .status
            .parse()
            .map_err(|e| decode_error(&self.pass_id, "status", e))?;
        let errors: Vec<String> = serde_json::from_str(&self.errors)
            .map_err(|e| decode_error(&self.pass_id, "errors", e))?;
        let [scanned, unchanged, succeeded, failed, blocked, deleted] =
            self.counts.map(|c| c.max(0) as usize);

        Ok(PassSummary {
            started_at: from_millis(&self.pass_id, "started_at", self.started_at)?,
            finished_at: from_millis(&self.pass_id, "finished_at", self.finished_at)?,
            pass_id: PassId::from_string(self.pass_id),
            trigger,
            status,
            scanned,
            unchanged,
            succeeded,
            failed,
            blocked,
            deleted,
            errors,
        })
    }
}
