use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use freewrite_core::remote::DEFAULT_ANALYSIS_TYPE;

#[derive(Parser)]
#[command(name = "freewrite")]
#[command(about = "Write freely, sync when you can")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Journal service base URL (overrides FREEWRITE_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Quick capture: freewrite "my thought here"
    #[arg(trailing_var_arg = true)]
    pub entry: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a new entry
    #[command(alias = "add")]
    New {
        /// Entry content
        content: Vec<String>,
    },
    /// List recent entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print an entry
    Show {
        /// Entry ID or unique ID prefix
        id: String,
    },
    /// Edit an existing entry
    Edit {
        /// Entry ID or unique ID prefix
        id: String,
    },
    /// Delete an entry here and on the journal service
    Delete {
        /// Entry ID or unique ID prefix
        id: String,
    },
    /// Push local changes, then pull entries from the journal service
    Sync,
    /// Push one entry even if it looks synced
    Push {
        /// Entry ID or unique ID prefix
        id: String,
    },
    /// Pull entries from the journal service without pushing
    Pull,
    /// Show connectivity and pending changes
    Status,
    /// Keep syncing in the background until interrupted
    Watch,
    /// Ask the journal service for a writing prompt
    Prompt,
    /// Ask the journal service to analyze an entry
    Analyze {
        /// Entry ID or unique ID prefix
        id: String,
        /// Analysis type understood by the service
        #[arg(long = "type", default_value = DEFAULT_ANALYSIS_TYPE)]
        analysis_type: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
