use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "image-explorer")]
#[command(about = "Browse image directories with history, ratings and a stepped-zoom viewer")]
pub struct Cli {
    /// Log at debug level to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an interactive session reading commands from stdin (default)
    Run {
        /// Persisted state file, created on exit if missing
        #[arg(short, long)]
        state: Option<PathBuf>,
        /// Directory to open, overriding the persisted one
        directory: Option<PathBuf>,
    },
    /// Execute a command against a persisted state and print the result
    Execute {
        /// Path to the JSON state file
        #[arg(short, long)]
        state: PathBuf,
        /// Command to execute (e.g., "cd:/photos", "next", "sequence:[next,open]")
        #[arg(short = 'x', long)]
        command: String,
        /// Output file for the resulting snapshot (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Seconds to wait for listings to settle
        #[arg(long, default_value = "5")]
        settle_timeout: u64,
    },
    /// Print one sorted directory listing
    List {
        directory: PathBuf,
        /// Sort key: name, rating or modified_at
        #[arg(long, default_value = "name")]
        sort: String,
        #[arg(long)]
        descending: bool,
        #[arg(long)]
        recursive: bool,
    },
}
