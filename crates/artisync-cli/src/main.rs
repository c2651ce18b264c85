//! artisync CLI
//!
//! Operator view of the persisted synchronization state. Passes are run by
//! the embedding service that registers handlers, not from here.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "artisync")]
#[command(about = "artisync - artifact reconciliation state", long_about = None)]
struct Cli {
    /// State database (defaults to ARTISYNC_DB_PATH, then .artisync/state.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the state database or bring its schema up to date
    Migrate,
    /// List persisted artifact states
    Status(commands::status::StatusArgs),
    /// Show recent synchronization passes
    Passes(commands::passes::PassesArgs),
}

fn main() {
    let cli = Cli::parse();

    let config = match artisync_engine::SyncConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    artisync_core::logging_facility::init(config.log_profile);
    let db_path = cli.db.unwrap_or(config.db_path);

    let result = match cli.command {
        Commands::Migrate => commands::migrate::execute(&db_path),
        Commands::Status(args) => commands::status::execute(&db_path, args),
        Commands::Passes(args) => commands::passes::execute(&db_path, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
