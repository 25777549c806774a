// Library module containing testable functions from main.rs

use crate::app::App;
use crate::async_task;
use crate::command::Command;
use crate::config::{PersistedState, Settings};
use crate::error::{ExplorerError, Result};
use crate::file::FileRecord;
use crate::order::{self, OrderPreference, SortKey};
use crate::watch::{NoopWatchFactory, NotifyWatchFactory};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const INTERACTIVE_SETTLE: Duration = Duration::from_secs(5);

/// Load state, run one command, print the resulting snapshot and save state
pub async fn execute_command(
    state_path: &Path,
    command_str: &str,
    output_path: Option<&Path>,
    settle_timeout: Duration,
) -> Result<()> {
    let state = PersistedState::load_or_default(state_path)?;

    let command = Command::from_string(command_str).map_err(ExplorerError::Command)?;

    let mut app = App::from_persisted(&state, Box::new(NoopWatchFactory));
    app.settle(settle_timeout).await?;
    app.run_command(command, settle_timeout).await?;

    let snapshot_json = serde_json::to_string_pretty(&app.snapshot())?;
    match output_path {
        Some(path) => {
            fs::write(path, &snapshot_json)?;
            println!("Result saved to: {}", path.display());
        }
        None => {
            println!("{}", snapshot_json);
        }
    }

    eprintln!("Status: {}", app.status_message);
    if app.should_quit {
        eprintln!("Command resulted in quit");
    }

    app.to_persisted().save_to_file(state_path)?;
    Ok(())
}

/// List `directory` the way the explorer would and sort it
pub async fn list_command(
    directory: PathBuf,
    sort: &str,
    descending: bool,
    recursive: bool,
) -> Result<Vec<FileRecord>> {
    let key: SortKey = sort.parse().map_err(ExplorerError::Command)?;
    let settings = Settings::default();

    let entries = async_task::list_files(directory, recursive).await?;
    let files: Vec<FileRecord> = entries
        .into_iter()
        .filter(|entry| entry.is_directory || settings.is_file_available(&entry.path))
        .map(|entry| FileRecord::from_entry(entry, 0))
        .collect();

    Ok(order::sort_files(&files, OrderPreference { key, descending }))
}

pub fn format_listing(files: &[FileRecord]) -> String {
    files
        .iter()
        .map(|file| {
            let marker = if file.is_directory { "/" } else { "" };
            format!(
                "{}\t{}{}",
                file.modified_at.format("%Y-%m-%d %H:%M"),
                file.name,
                marker
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line-oriented session: one command per stdin line until `quit` or EOF
pub async fn run_session(state_path: Option<&Path>, directory: Option<PathBuf>) -> Result<()> {
    let mut state = match state_path {
        Some(path) => PersistedState::load_or_default(path)?,
        None => PersistedState::default(),
    };
    if let Some(directory) = directory {
        state.directory = Some(directory);
    }
    if state.directory.is_none() {
        state.directory = Some(std::env::current_dir()?);
    }

    let mut app = App::from_persisted(&state, Box::new(NotifyWatchFactory));
    if let Err(e) = app.settle(INTERACTIVE_SETTLE).await {
        log::warn!("Initial load did not settle: {}", e);
    }
    print_status(&app);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !app.should_quit {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                match Command::from_string(line) {
                    Ok(command) => {
                        if let Err(e) = app.run_command(command, INTERACTIVE_SETTLE).await {
                            app.status_message = format!("Error: {}", e);
                        }
                    }
                    Err(e) => app.status_message = e,
                }
                print_status(&app);
            }
            active = app.process_next() => {
                if !active {
                    break;
                }
                if !app.is_busy() {
                    print_status(&app);
                }
            }
        }
    }

    if let Some(path) = state_path {
        app.to_persisted().save_to_file(path)?;
        log::info!("State saved to {}", path.display());
    }
    Ok(())
}

fn print_status(app: &App) {
    let directory = app
        .explorer
        .directory()
        .map(|d| d.display().to_string())
        .unwrap_or_default();
    let selected = app
        .explorer
        .selected_index()
        .map(|i| format!(" [{}]", i))
        .unwrap_or_default();
    println!(
        "{:?} {} ({} entries){} - {}",
        app.screen,
        directory,
        app.explorer.filtered_files().len(),
        selected,
        app.status_message
    );
    if let Some(current) = app.viewer.current_path() {
        println!("  viewing {} at {:.2}x", current.display(), app.viewer.scale());
    }
}
