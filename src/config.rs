use anyhow::{Context, Result};
use chrono::Duration;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::reminder::DEFAULT_LEAD_SECS;

const CONFIG_FILE: &str = "config.yml";
const MIN_LEAD_SECS: i64 = 1;
const MAX_LEAD_SECS: i64 = 24 * 60 * 60;
const MIN_TICK_MILLIS: i64 = 100;
const MAX_TICK_MILLIS: i64 = 60 * 60 * 1000;

fn default_categories() -> Vec<String> {
    vec![
        "Work".into(),
        "Personal".into(),
        "Study".into(),
        "Health".into(),
    ]
}

fn default_moods() -> Vec<String> {
    vec![
        "😊 Happy".into(),
        "😐 Neutral".into(),
        "😢 Sad".into(),
        "😠 Angry".into(),
        "😴 Tired".into(),
    ]
}

fn default_reminder_lead_secs() -> i64 {
    DEFAULT_LEAD_SECS
}

fn default_tick_millis() -> i64 {
    1000
}

fn default_notifications() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_moods")]
    pub moods: Vec<String>,
    #[serde(default = "default_reminder_lead_secs")]
    pub reminder_lead_secs: i64,
    #[serde(default = "default_tick_millis")]
    pub tick_millis: i64,
    #[serde(default = "default_notifications")]
    pub notifications: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            categories: default_categories(),
            moods: default_moods(),
            reminder_lead_secs: default_reminder_lead_secs(),
            tick_millis: default_tick_millis(),
            notifications: default_notifications(),
            log_level: None,
        }
    }
}

impl PlannerConfig {
    pub fn reminder_lead(&self) -> Duration {
        Duration::seconds(self.reminder_lead_secs.clamp(MIN_LEAD_SECS, MAX_LEAD_SECS))
    }

    pub fn tick_period(&self) -> Duration {
        Duration::milliseconds(self.tick_millis.clamp(MIN_TICK_MILLIS, MAX_TICK_MILLIS))
    }

    /// Pulls the timings into range, drops blank entries so the pickers never
    /// offer an empty choice, and restores defaults for lists that end up
    /// empty.
    pub fn normalized(mut self) -> Self {
        self.reminder_lead_secs = self.reminder_lead_secs.clamp(MIN_LEAD_SECS, MAX_LEAD_SECS);
        self.tick_millis = self.tick_millis.clamp(MIN_TICK_MILLIS, MAX_TICK_MILLIS);
        self.categories.retain(|c| !c.trim().is_empty());
        self.moods.retain(|m| !m.trim().is_empty());
        if self.categories.is_empty() {
            self.categories = default_categories();
        }
        if self.moods.is_empty() {
            self.moods = default_moods();
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit,
    Platform,
}

#[derive(Debug, Clone)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub source: ConfigSource,
}

pub fn locate_config(explicit: Option<&Path>) -> Result<ConfigLocation> {
    if let Some(path) = explicit {
        return Ok(ConfigLocation {
            path: path.to_path_buf(),
            source: ConfigSource::Explicit,
        });
    }
    let dirs = project_dirs()?;
    Ok(ConfigLocation {
        path: dirs.config_dir().join(CONFIG_FILE),
        source: ConfigSource::Platform,
    })
}

/// Reads the config file, falling back to defaults when it does not exist.
pub fn load_config(location: &ConfigLocation) -> Result<PlannerConfig> {
    if !location.path.exists() {
        return Ok(PlannerConfig::default());
    }
    let data = fs::read_to_string(&location.path)
        .with_context(|| format!("reading {:?}", location.path))?;
    if data.trim().is_empty() {
        return Ok(PlannerConfig::default());
    }
    let config: PlannerConfig = serde_yaml::from_str(&data).context("parsing config file")?;
    Ok(config.normalized())
}

pub fn save_config(location: &ConfigLocation, config: &PlannerConfig) -> Result<()> {
    if let Some(parent) = location.path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(&location.path, serialized)
        .with_context(|| format!("writing {:?}", location.path))?;
    Ok(())
}

/// Writes a default config unless one already exists. Returns true when a
/// file was written.
pub fn init_config(location: &ConfigLocation) -> Result<bool> {
    if location.path.exists() {
        return Ok(false);
    }
    save_config(location, &PlannerConfig::default())?;
    Ok(true)
}

pub fn default_log_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("logs"))
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "dayplan").context("locating platform directories")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn location_in(dir: &Path) -> ConfigLocation {
        locate_config(Some(&dir.join("nested").join(CONFIG_FILE))).unwrap()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let location = location_in(dir.path());
        assert_eq!(location.source, ConfigSource::Explicit);
        let config = load_config(&location).unwrap();
        assert_eq!(config, PlannerConfig::default());
        assert_eq!(config.reminder_lead(), Duration::seconds(60));
        assert_eq!(config.tick_period(), Duration::milliseconds(1000));
    }

    #[test]
    fn init_writes_once_and_never_overwrites() {
        let dir = tempdir().unwrap();
        let location = location_in(dir.path());
        assert!(init_config(&location).unwrap());

        let mut custom = PlannerConfig::default();
        custom.categories = vec!["Errands".into()];
        save_config(&location, &custom).unwrap();

        assert!(!init_config(&location).unwrap());
        assert_eq!(load_config(&location).unwrap().categories, vec!["Errands"]);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let location = location_in(dir.path());
        fs::create_dir_all(location.path.parent().unwrap()).unwrap();
        fs::write(
            &location.path,
            "moods: [\"  \", \"🤩 Excited\"]\nreminder_lead_secs: 300\ntick_millis: 5\n",
        )
        .unwrap();

        let config = load_config(&location).unwrap();
        assert_eq!(config.moods, vec!["🤩 Excited"]);
        assert_eq!(config.categories, default_categories());
        assert_eq!(config.reminder_lead(), Duration::minutes(5));
        assert_eq!(config.tick_period(), Duration::milliseconds(100));
        assert!(config.notifications);
    }

    #[test]
    fn empty_lists_fall_back_to_defaults() {
        let config = PlannerConfig {
            categories: vec![" ".into()],
            moods: Vec::new(),
            ..PlannerConfig::default()
        }
        .normalized();
        assert_eq!(config.categories, default_categories());
        assert_eq!(config.moods, default_moods());
    }

    #[test]
    fn out_of_range_timings_are_clamped() {
        let dir = tempdir().unwrap();
        let location = location_in(dir.path());
        fs::create_dir_all(location.path.parent().unwrap()).unwrap();
        fs::write(
            &location.path,
            "reminder_lead_secs: 100000000000000\ntick_millis: 9223372036854775807\n",
        )
        .unwrap();

        let config = load_config(&location).unwrap();
        assert_eq!(config.reminder_lead_secs, MAX_LEAD_SECS);
        assert_eq!(config.reminder_lead(), Duration::days(1));
        assert_eq!(config.tick_period(), Duration::hours(1));

        let raw = PlannerConfig {
            reminder_lead_secs: i64::MAX,
            tick_millis: i64::MIN,
            ..PlannerConfig::default()
        };
        assert_eq!(raw.reminder_lead(), Duration::days(1));
        assert_eq!(raw.tick_period(), Duration::milliseconds(100));
    }

    #[test]
    fn zero_lead_is_raised_to_one_second() {
        let config = PlannerConfig {
            reminder_lead_secs: 0,
            ..PlannerConfig::default()
        }
        .normalized();
        assert_eq!(config.reminder_lead_secs, 1);
        assert_eq!(config.reminder_lead(), Duration::seconds(1));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let location = location_in(dir.path());
        fs::create_dir_all(location.path.parent().unwrap()).unwrap();
        fs::write(&location.path, "categories: {not: [a list").unwrap();
        assert!(load_config(&location).is_err());
    }
}
