pub mod app;
pub mod async_task;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod explorer;
pub mod file;
pub mod history;
pub mod listing;
pub mod main_lib;
pub mod order;
pub mod stores;
pub mod viewer;
pub mod watch;
