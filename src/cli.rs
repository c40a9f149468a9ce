use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dayplan", version, about = "Terminal daily planner with event reminders")]
pub struct Cli {
    /// Use this config file instead of the platform default
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default config file if none exists
    Init,
    /// Show where the config lives and what it resolves to
    Config,
    /// Print the countdown to the soonest of the given times
    Countdown {
        /// Event time in HH:MM format (repeatable)
        #[arg(long = "event", short = 'e')]
        events: Vec<String>,
    },
    /// Launch the interactive TUI
    Tui,
}
