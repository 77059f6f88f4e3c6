mod commands;
mod config;
mod main_lib;

use clap::{Parser, Subcommand};
use config::Config;
use main_lib::{build_state, init_tracing};

/// dompet: inspect and maintain the local finance store.
#[derive(Parser)]
#[command(name = "dompet", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the store, applying pending upgrades and first-run defaults.
    Init,

    /// Print the whole store as one snapshot document.
    Export,

    /// Write a dated snapshot file to the backup directory.
    Backup,

    /// Replace the whole store with a snapshot file.
    Restore {
        /// Path to a snapshot JSON file.
        file: String,
    },

    /// Empty every collection and reset the gold price.
    Clear {
        /// Confirm the reset. There is no undo.
        #[arg(long)]
        yes: bool,
    },

    /// List the records of a collection.
    List {
        /// Collection name, e.g. `wallets`.
        collection: String,
    },

    /// Print one record.
    Get { collection: String, id: String },

    /// Add a record, or replace it for single-record collections.
    Put {
        collection: String,
        /// The record as a JSON object.
        json: String,
    },

    /// Delete one record.
    Delete { collection: String, id: String },

    /// Show or set the quick note.
    Note {
        /// New note text. Prints the current note when omitted.
        text: Option<String>,

        /// Clear the note.
        #[arg(long, conflicts_with = "text")]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();
    let config = Config::from_env();
    let state = build_state(&config)?;

    match cli.command {
        Commands::Init => commands::init(&state).await,
        Commands::Export => commands::export(&state).await,
        Commands::Backup => commands::backup(&state).await,
        Commands::Restore { file } => commands::restore(&state, &file).await,
        Commands::Clear { yes } => commands::clear(&state, yes).await,
        Commands::List { collection } => commands::list(&state, &collection).await,
        Commands::Get { collection, id } => commands::get(&state, &collection, &id).await,
        Commands::Put { collection, json } => commands::put(&state, &collection, &json).await,
        Commands::Delete { collection, id } => commands::delete(&state, &collection, &id).await,
        Commands::Note { text, clear } => commands::note(&state, text.as_deref(), clear).await,
    }
}
