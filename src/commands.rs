use anyhow::{anyhow, Context, Result};
use dayplan::clock::{Clock, SystemClock};
use dayplan::config::{
    default_log_dir, init_config, load_config, locate_config, ConfigLocation, ConfigSource,
    PlannerConfig,
};
use dayplan::countdown::next_countdown;
use dayplan::format::parse_time_of_day;
use dayplan::logging::{default_log_level, init_logging};
use std::path::PathBuf;

use crate::ui;

pub struct Options {
    pub config: Option<PathBuf>,
    pub log_level: Option<String>,
}

pub fn init(options: &Options) -> Result<()> {
    let location = locate_config(options.config.as_deref())?;
    if init_config(&location)? {
        println!("Wrote default config to {}", location.path.display());
    } else {
        println!("Config already exists at {}", location.path.display());
    }
    Ok(())
}

pub fn show_config(options: &Options) -> Result<()> {
    let (config, location) = load_current_config(options)?;
    println!(
        "Config: {} ({}{})",
        location.path.display(),
        match location.source {
            ConfigSource::Explicit => "explicit",
            ConfigSource::Platform => "platform",
        },
        if location.path.exists() { "" } else { ", not written yet" }
    );
    println!("  categories: {}", config.categories.join(", "));
    println!("  moods: {}", config.moods.join(", "));
    println!("  reminder lead: {}s", config.reminder_lead().num_seconds());
    println!("  tick: {}ms", config.tick_period().num_milliseconds());
    println!(
        "  notifications: {}",
        if config.notifications { "on" } else { "off" }
    );
    println!("  log level: {}", resolve_log_level(options, &config));
    println!("  log dir: {}", default_log_dir()?.display());
    Ok(())
}

pub fn countdown(events: Vec<String>) -> Result<()> {
    let times = events
        .iter()
        .map(|raw| {
            parse_time_of_day(raw).ok_or_else(|| anyhow!("invalid time (use HH:MM): {}", raw))
        })
        .collect::<Result<Vec<_>>>()?;
    println!("{}", next_countdown(times, SystemClock.now()));
    Ok(())
}

pub fn tui(options: &Options) -> Result<()> {
    let (config, location) = load_current_config(options)?;
    let level = resolve_log_level(options, &config);
    init_logging(&level, &default_log_dir()?).context("starting file logging")?;
    log::info!(
        "event=config_loaded module=commands path={} categories={} moods={}",
        location.path.display(),
        config.categories.len(),
        config.moods.len()
    );
    ui::run(config, Box::new(SystemClock))
}

fn load_current_config(options: &Options) -> Result<(PlannerConfig, ConfigLocation)> {
    let location = locate_config(options.config.as_deref())?;
    let config = load_config(&location)?;
    Ok((config, location))
}

fn resolve_log_level(options: &Options, config: &PlannerConfig) -> String {
    options
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| default_log_level().to_string())
}
