use clap::Parser;
use image_explorer::cli::{Cli, Commands};
use image_explorer::error::Result;
use image_explorer::main_lib;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to a file when IMAGE_EXPLORER_LOG names one, else to stderr on --verbose
    if let Ok(log_file) = std::env::var("IMAGE_EXPLORER_LOG") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        env_logger::Builder::new()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else if cli.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }
    log::info!("Image Explorer starting up");

    match cli.command.unwrap_or(Commands::Run {
        state: None,
        directory: None,
    }) {
        Commands::Run { state, directory } => {
            main_lib::run_session(state.as_deref(), directory).await
        }
        Commands::Execute {
            state,
            command,
            output,
            settle_timeout,
        } => {
            main_lib::execute_command(
                &state,
                &command,
                output.as_deref(),
                Duration::from_secs(settle_timeout),
            )
            .await
        }
        Commands::List {
            directory,
            sort,
            descending,
            recursive,
        } => {
            let files = main_lib::list_command(directory, &sort, descending, recursive).await?;
            println!("{}", main_lib::format_listing(&files));
            Ok(())
        }
    }
}
