pub mod ideas;
pub mod visualize;

use std::path::PathBuf;
use std::time::Duration;

use clap::Subcommand;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a repository's open issues and emit the graph as JSON
    Visualize(visualize::VisualizeArgs),
    /// Generate idea cards from the issue backlog, streamed as they decode
    Ideas(ideas::IdeasArgs),
}

pub async fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Visualize(args) => visualize::run(args).await,
        Command::Ideas(args) => ideas::run(args).await,
    }
}

/// Default location of the settings file (the persistence port that
/// stands in for browser storage).
pub fn default_settings_path() -> PathBuf {
    std::env::var_os("ISSUEGRAPH_CONFIG").map_or_else(
        || {
            dirs_home()
                .join(".config")
                .join("issuegraph")
                .join("settings.toml")
        },
        PathBuf::from,
    )
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from)
}

/// The loading indicator: shown before the operation starts, cleared
/// unconditionally on every exit path.
pub fn loading_spinner(msg: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(msg);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
