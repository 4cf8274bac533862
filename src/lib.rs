pub mod api;
pub mod cli;
pub mod config;
pub mod dump;
pub mod listing;
pub mod tui;
