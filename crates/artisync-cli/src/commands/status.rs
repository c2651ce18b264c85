//! Status command
//!
//! Usage: artisync status [--lifecycle <STATE> | --failed] [--type <TYPE>] [--json]

use super::open_existing;
use artisync_core::model::{ArtifactLifecycle, ArtifactState};
use artisync_core::state::StateStore;
use clap::Args;
use std::path::Path;

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Only artifacts in this lifecycle state (e.g. FAILED_CREATE_UPDATE)
    #[arg(long, conflicts_with = "failed")]
    pub lifecycle: Option<String>,

    /// Only artifacts in a failed state
    #[arg(long)]
    pub failed: bool,

    /// Only artifacts of this type
    #[arg(long = "type")]
    pub artifact_type: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn execute(db_path: &Path, args: StatusArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_existing(db_path)?;

    let states = match (&args.lifecycle, &args.artifact_type) {
        (Some(lifecycle), _) => {
            let lifecycle: ArtifactLifecycle = lifecycle.parse()?;
            store.list_by_lifecycle(lifecycle)?
        }
        (None, Some(artifact_type)) => store.list_by_type(artifact_type)?,
        (None, None) => store.list_all()?,
    };
    let states: Vec<ArtifactState> = states
        .into_iter()
        .filter(|s| !args.failed || s.lifecycle.is_failed())
        .filter(|s| {
            args.artifact_type
                .as_deref()
                .map_or(true, |t| s.artifact_type == t)
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&states)?);
        return Ok(());
    }

    if states.is_empty() {
        println!("No artifacts");
        return Ok(());
    }
    for state in &states {
        println!(
            "{:<24} {:<14} {:<40} {}",
            state.lifecycle.as_str(),
            state.artifact_type,
            state.location,
            state.name
        );
        if let Some(error) = &state.error {
            println!("    error: {}", error);
        }
    }
    println!("{} artifact(s)", states.len());
    Ok(())
}
