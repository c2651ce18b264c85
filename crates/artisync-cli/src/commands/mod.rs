pub mod migrate;
pub mod passes;
pub mod status;

use artisync_store::SqliteStateStore;
use std::path::Path;

/// Open a database that `migrate` already created
///
/// Inspection commands never create an empty database as a side effect.
pub(crate) fn open_existing(db_path: &Path) -> Result<SqliteStateStore, Box<dyn std::error::Error>> {
    if !db_path.is_file() {
        return Err(format!(
            "No state database at {} (run `artisync migrate` first)",
            db_path.display()
        )
        .into());
    }
    Ok(SqliteStateStore::open(db_path)?)
}
