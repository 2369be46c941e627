mod app;
mod config;
mod effects;
mod input;
mod persistence;
mod ui;

pub use app::{run_interactive, run_once, toggle_theme};
pub use config::AppConfig;
