use clap::Parser;
use image_explorer::app::AppSnapshot;
use image_explorer::cli::{Cli, Commands};
use image_explorer::config::PersistedState;
use image_explorer::error::ExplorerError;
use image_explorer::main_lib;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio_test::assert_ok;

fn create_photo_dir() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("b.png"), b"png").unwrap();
    fs::write(root.join("a.jpg"), b"jpg").unwrap();
    fs::write(root.join("readme.md"), b"md").unwrap();
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("sub").join("c.png"), b"png").unwrap();
    temp_dir
}

#[test]
fn test_cli_parsing() {
    let cli = Cli::try_parse_from(["image-explorer", "execute", "-s", "state.json", "-x", "next"])
        .unwrap();
    match cli.command {
        Some(Commands::Execute {
            state,
            command,
            output,
            settle_timeout,
        }) => {
            assert_eq!(state, PathBuf::from("state.json"));
            assert_eq!(command, "next");
            assert!(output.is_none());
            assert_eq!(settle_timeout, 5);
        }
        _ => panic!("expected execute"),
    }

    let cli = Cli::try_parse_from(["image-explorer", "--verbose", "run", "/photos"]).unwrap();
    assert!(cli.verbose);
    assert!(matches!(
        cli.command,
        Some(Commands::Run { state: None, directory: Some(ref d) }) if d == &PathBuf::from("/photos")
    ));

    let cli = Cli::try_parse_from(["image-explorer"]).unwrap();
    assert!(cli.command.is_none());

    assert!(Cli::try_parse_from(["image-explorer", "execute", "-x", "next"]).is_err());
}

#[tokio::test]
async fn test_list_command_sorts_and_filters() {
    let dir = create_photo_dir();

    let files = main_lib::list_command(dir.path().to_path_buf(), "name", true, false)
        .await
        .unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["sub", "b.png", "a.jpg"]);

    let files = main_lib::list_command(dir.path().to_path_buf(), "name", false, true)
        .await
        .unwrap();
    assert_eq!(files.len(), 4);

    let listing = main_lib::format_listing(&files);
    assert!(listing.lines().any(|line| line.ends_with("\tsub/")));
}

#[tokio::test]
async fn test_list_command_rejects_bad_input() {
    let dir = create_photo_dir();
    let result = main_lib::list_command(dir.path().to_path_buf(), "size", false, false).await;
    assert!(matches!(result, Err(ExplorerError::Command(_))));

    let result =
        main_lib::list_command(dir.path().join("missing"), "name", false, false).await;
    assert!(matches!(result, Err(ExplorerError::InvalidDirectory(_))));
}

#[tokio::test]
async fn test_execute_command_writes_snapshot_and_state() {
    let dir = create_photo_dir();
    let state_dir = TempDir::new().unwrap();
    let state_path = state_dir.path().join("state.json");
    let output_path = state_dir.path().join("snapshot.json");

    let initial = PersistedState {
        directory: Some(dir.path().to_path_buf()),
        ..PersistedState::default()
    };
    initial.save_to_file(&state_path).unwrap();

    assert_ok!(
        main_lib::execute_command(
            &state_path,
            "sequence:[first,next,rate:5,sort:rating]",
            Some(&output_path),
            Duration::from_secs(5),
        )
        .await
    );

    let snapshot: AppSnapshot =
        serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(snapshot.explorer.files[0].name, "b.png");
    assert_eq!(snapshot.explorer.files[0].rating, 5);
    assert_eq!(snapshot.explorer.selected, Some(dir.path().join("b.png")));

    let saved = PersistedState::load_from_file(&state_path).unwrap();
    assert_eq!(saved.ratings.get(&dir.path().join("b.png")), Some(&5));
    assert_eq!(saved.directory, Some(dir.path().to_path_buf()));

    // The saved state drives the next run
    assert_ok!(
        main_lib::execute_command(&state_path, "enter", Some(&output_path), Duration::from_secs(5))
            .await
    );
    let snapshot: AppSnapshot =
        serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(snapshot.explorer.order.key, image_explorer::order::SortKey::Rating);
    assert!(snapshot.explorer.selected.is_none());
}

#[tokio::test]
async fn test_execute_command_rejects_unknown_command() {
    let state_dir = TempDir::new().unwrap();
    let state_path = state_dir.path().join("state.json");
    let result =
        main_lib::execute_command(&state_path, "fly", None, Duration::from_secs(1)).await;
    assert!(matches!(result, Err(ExplorerError::Command(_))));
    assert!(!state_path.exists());
}
