//! Passes command
//!
//! Usage: artisync passes [--limit <N>] [--json]

use super::open_existing;
use artisync_core::state::StateStore;
use clap::Args;
use std::path::Path;

#[derive(Debug, Args)]
pub struct PassesArgs {
    /// Number of passes to show, newest first
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn execute(db_path: &Path, args: PassesArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_existing(db_path)?;
    let passes = store.recent_passes(args.limit)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&passes)?);
        return Ok(());
    }

    if passes.is_empty() {
        println!("No passes recorded");
        return Ok(());
    }
    for pass in &passes {
        println!(
            "{} {:<22} {:<9} {}  scanned={} unchanged={} succeeded={} failed={} blocked={} deleted={}",
            pass.started_at.format("%Y-%m-%d %H:%M:%S"),
            pass.status.as_str(),
            pass.trigger.as_str(),
            pass.pass_id,
            pass.scanned,
            pass.unchanged,
            pass.succeeded,
            pass.failed,
            pass.blocked,
            pass.deleted
        );
        for error in &pass.errors {
            println!("    {}", error);
        }
    }
    Ok(())
}
