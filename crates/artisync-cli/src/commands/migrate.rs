//! Migrate command
//!
//! Usage: artisync migrate [--db <PATH>]

use artisync_store::db::open_migrated;
use artisync_store::migrations::applied_migrations;
use std::path::Path;

pub fn execute(db_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_migrated(db_path)?;
    let applied = applied_migrations(&conn)?;

    println!("✓ State database ready at {}", db_path.display());
    for migration in applied {
        println!("  {}", migration);
    }
    Ok(())
}
