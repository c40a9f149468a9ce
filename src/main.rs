mod cli;
mod commands;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let options = commands::Options {
        config: args.config,
        log_level: args.log_level,
    };
    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Init => commands::init(&options),
        cli::Command::Config => commands::show_config(&options),
        cli::Command::Countdown { events } => commands::countdown(events),
        cli::Command::Tui => commands::tui(&options),
    }
}
