use crate::order::SortKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Represents all possible user commands that can be executed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    // Global commands
    Quit,

    // Explorer navigation
    ChangeDirectory(PathBuf),
    Back(usize),
    Forward(usize),
    UpDirectory,
    Reload,
    EnterSelected,
    OpenSelected,
    ViewSelected,

    // Explorer listing
    Search(String),
    SortBy(SortKey),
    SelectFirst,
    SelectLast,
    SelectNext,
    SelectPrevious,
    SelectIndex(usize),
    Rate(u8),
    ToggleBookmark,
    Scroll(f64),
    GridView,
    ListView,

    // Viewer
    ViewerNext,
    ViewerPrevious,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    Zoom(f64),
    Dismiss,

    // Multi-step commands for testing
    Sequence(Vec<Command>),
}

impl Command {
    /// Parse a command from a string representation
    pub fn from_string(s: &str) -> Result<Self, String> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "quit" | "q" => return Ok(Command::Quit),

            "back" => return Ok(Command::Back(0)),
            "forward" => return Ok(Command::Forward(0)),
            "up" => return Ok(Command::UpDirectory),
            "reload" => return Ok(Command::Reload),
            "enter" => return Ok(Command::EnterSelected),
            "open" => return Ok(Command::OpenSelected),
            "view" => return Ok(Command::ViewSelected),

            "first" | "home" => return Ok(Command::SelectFirst),
            "last" | "end" => return Ok(Command::SelectLast),
            "next" | "down" => return Ok(Command::SelectNext),
            "prev" | "previous" => return Ok(Command::SelectPrevious),
            "bookmark" => return Ok(Command::ToggleBookmark),
            "grid" => return Ok(Command::GridView),
            "list" => return Ok(Command::ListView),

            "viewer_next" | "right" => return Ok(Command::ViewerNext),
            "viewer_prev" | "left" => return Ok(Command::ViewerPrevious),
            "zoom_in" | "+" => return Ok(Command::ZoomIn),
            "zoom_out" | "-" => return Ok(Command::ZoomOut),
            "zoom_reset" | "0" => return Ok(Command::ZoomReset),
            "dismiss" | "escape" => return Ok(Command::Dismiss),
            _ => {}
        }

        if let Some(inner) = s
            .strip_prefix("sequence:[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            // sequence:[cmd1,cmd2,cmd3]
            if inner.trim().is_empty() {
                return Ok(Command::Sequence(vec![]));
            }
            let mut commands = Vec::new();
            for cmd_str in inner.split(',') {
                let cmd_str = cmd_str.trim();
                match Command::from_string(cmd_str) {
                    Ok(cmd) => commands.push(cmd),
                    Err(e) => {
                        return Err(format!("Invalid command in sequence '{}': {}", cmd_str, e))
                    }
                }
            }
            return Ok(Command::Sequence(commands));
        }

        let Some((name, argument)) = s.split_once(':') else {
            return Err(format!("Unknown command: {}", s));
        };

        match name.to_lowercase().as_str() {
            "cd" if !argument.is_empty() => Ok(Command::ChangeDirectory(PathBuf::from(argument))),
            "back" => parse_number(argument).map(Command::Back),
            "forward" => parse_number(argument).map(Command::Forward),
            "search" => Ok(Command::Search(argument.to_string())),
            "sort" => argument.parse().map(Command::SortBy),
            "select" => parse_number(argument).map(Command::SelectIndex),
            "rate" => match argument.parse::<u8>() {
                Ok(rating) if rating <= 5 => Ok(Command::Rate(rating)),
                _ => Err(format!("Rating must be between 0 and 5: {}", argument)),
            },
            "scroll" => parse_float(argument).map(Command::Scroll),
            "zoom" => match parse_float(argument)? {
                scale if scale > 0.0 => Ok(Command::Zoom(scale)),
                _ => Err(format!("Zoom scale must be positive: {}", argument)),
            },
            _ => Err(format!("Unknown command: {}", s)),
        }
    }
}

fn parse_number(argument: &str) -> Result<usize, String> {
    argument
        .parse()
        .map_err(|_| format!("Expected a number: {}", argument))
}

fn parse_float(argument: &str) -> Result<f64, String> {
    argument
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| format!("Expected a number: {}", argument))
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Quit => write!(f, "quit"),

            Command::ChangeDirectory(path) => write!(f, "cd:{}", path.display()),
            Command::Back(0) => write!(f, "back"),
            Command::Back(offset) => write!(f, "back:{}", offset),
            Command::Forward(0) => write!(f, "forward"),
            Command::Forward(offset) => write!(f, "forward:{}", offset),
            Command::UpDirectory => write!(f, "up"),
            Command::Reload => write!(f, "reload"),
            Command::EnterSelected => write!(f, "enter"),
            Command::OpenSelected => write!(f, "open"),
            Command::ViewSelected => write!(f, "view"),

            Command::Search(query) => write!(f, "search:{}", query),
            Command::SortBy(key) => write!(f, "sort:{}", key),
            Command::SelectFirst => write!(f, "first"),
            Command::SelectLast => write!(f, "last"),
            Command::SelectNext => write!(f, "next"),
            Command::SelectPrevious => write!(f, "prev"),
            Command::SelectIndex(index) => write!(f, "select:{}", index),
            Command::Rate(rating) => write!(f, "rate:{}", rating),
            Command::ToggleBookmark => write!(f, "bookmark"),
            Command::Scroll(scroll_top) => write!(f, "scroll:{}", scroll_top),
            Command::GridView => write!(f, "grid"),
            Command::ListView => write!(f, "list"),

            Command::ViewerNext => write!(f, "viewer_next"),
            Command::ViewerPrevious => write!(f, "viewer_prev"),
            Command::ZoomIn => write!(f, "zoom_in"),
            Command::ZoomOut => write!(f, "zoom_out"),
            Command::ZoomReset => write!(f, "zoom_reset"),
            Command::Zoom(scale) => write!(f, "zoom:{}", scale),
            Command::Dismiss => write!(f, "dismiss"),

            Command::Sequence(commands) => {
                let inner = commands
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "sequence:[{}]", inner)
            }
        }
    }
}
