use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::display;
use crate::next_action::{self, NextAction};

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub db_path: Option<PathBuf>,
    pub timezone: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config file: {}", path.display()))
    }
}

/// The zone that decides what "today" means for the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerZone {
    Named(Tz),
    Local,
}

impl ViewerZone {
    pub fn parse(name: &str) -> Result<Self> {
        name.trim()
            .parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| anyhow!("Unknown time zone '{}'", name))
    }

    pub fn next_action(&self, due: Option<&str>, now: DateTime<Utc>) -> NextAction {
        match self {
            Self::Named(tz) => next_action::classify_iso(due, now, tz),
            Self::Local => next_action::classify_iso(due, now, &Local),
        }
    }

    pub fn short_date(&self, iso: Option<&str>) -> String {
        match self {
            Self::Named(tz) => display::format_short_date(iso, tz),
            Self::Local => display::format_short_date(iso, &Local),
        }
    }

    pub fn date(&self, iso: Option<&str>) -> String {
        match self {
            Self::Named(tz) => display::format_date(iso, tz),
            Self::Local => display::format_date(iso, &Local),
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub db_path: PathBuf,
    pub zone: ViewerZone,
}

impl Config {
    /// Resolve settings: explicit values (flags or their env vars) win over
    /// the config file, which wins over platform defaults.
    pub fn resolve(db_path: Option<PathBuf>, timezone: Option<String>) -> Result<Self> {
        let file = FileConfig::load(&Self::config_path())?;
        Self::merge(file, db_path, timezone)
    }

    fn merge(file: FileConfig, db_path: Option<PathBuf>, timezone: Option<String>) -> Result<Self> {
        let db_path = db_path
            .or(file.db_path)
            .unwrap_or_else(Self::default_db_path);

        let zone = match timezone.or(file.timezone) {
            Some(name) => ViewerZone::parse(&name)?,
            None => ViewerZone::Local,
        };

        tracing::debug!(db = %db_path.display(), ?zone, "resolved config");
        Ok(Self { db_path, zone })
    }

    pub fn config_path() -> PathBuf {
        match directories::ProjectDirs::from("", "", "apptrack") {
            Some(dirs) => dirs.config_dir().join("config.toml"),
            None => PathBuf::from("apptrack.toml"),
        }
    }

    fn default_db_path() -> PathBuf {
        // XDG data directory, or the working directory as a last resort
        match directories::ProjectDirs::from("", "", "apptrack") {
            Some(dirs) => dirs.data_dir().join("apptrack.db"),
            None => PathBuf::from("apptrack.db"),
        }
    }
}
