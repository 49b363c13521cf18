use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::cargo::Limits;
use crate::consts::{APP_DIR, HOME_ENV};

const DEFAULT_SESSION_HOURS: i64 = 8;
const DEFAULT_SCAN_COOLDOWN_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ConfigSortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ConfigColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) no_color: bool,
    #[serde(default)]
    pub(crate) order: Option<ConfigSortOrder>,
    #[serde(default)]
    pub(crate) color: Option<ConfigColorMode>,
    #[serde(default)]
    pub(crate) timezone: Option<String>,
    #[serde(default)]
    pub(crate) locale: Option<String>,

    /// Session validity window
    #[serde(default)]
    pub(crate) session_hours: Option<i64>,
    #[serde(default)]
    pub(crate) dimension_min: Option<u32>,
    #[serde(default)]
    pub(crate) dimension_max: Option<u32>,
    #[serde(default)]
    pub(crate) weight_min: Option<f64>,
    #[serde(default)]
    pub(crate) weight_max: Option<f64>,
    #[serde(default)]
    pub(crate) max_quantity: Option<u32>,
    #[serde(default)]
    pub(crate) max_photo_bytes: Option<usize>,
    #[serde(default)]
    pub(crate) scan_cooldown_secs: Option<u64>,

    /// Roster text file replacing the built-in employee table
    #[serde(default)]
    pub(crate) roster: Option<PathBuf>,
    #[serde(default)]
    pub(crate) data_dir: Option<PathBuf>,
}

impl Config {
    pub(crate) fn load() -> Self {
        // Try config locations in order of priority
        for path in Self::config_paths() {
            if path.exists()
                && let Ok(content) = fs::read_to_string(&path)
            {
                match toml::from_str::<Config>(&content) {
                    Ok(config) => {
                        debug!(path = %path.display(), "loaded config");
                        return config;
                    }
                    Err(e) => {
                        warn!("Failed to parse {}: {}", path.display(), e);
                    }
                }
            }
        }

        Self::default()
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Explicit home: $INTAKE_HOME/config.toml
        if let Some(home) = std::env::var_os(HOME_ENV) {
            paths.push(PathBuf::from(home).join("config.toml"));
        }

        // 2. XDG config: ~/.config/intake/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join(APP_DIR).join("config.toml"));
        }

        // 3. Platform config dir (macOS Application Support, etc.)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join(APP_DIR).join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 4. Home directory: ~/.intake.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{APP_DIR}.toml")));
        }

        paths
    }

    pub(crate) fn limits(&self) -> Limits {
        let defaults = Limits::default();
        Limits {
            dimension_min: self.dimension_min.unwrap_or(defaults.dimension_min),
            dimension_max: self.dimension_max.unwrap_or(defaults.dimension_max),
            weight_min: self.weight_min.unwrap_or(defaults.weight_min),
            weight_max: self.weight_max.unwrap_or(defaults.weight_max),
            max_quantity: self.max_quantity.unwrap_or(defaults.max_quantity),
            max_photo_bytes: self.max_photo_bytes.unwrap_or(defaults.max_photo_bytes),
        }
    }

    pub(crate) fn session_window(&self) -> TimeDelta {
        let hours = self.session_hours.unwrap_or(DEFAULT_SESSION_HOURS).max(0);
        TimeDelta::try_hours(hours).unwrap_or(TimeDelta::hours(DEFAULT_SESSION_HOURS))
    }

    pub(crate) fn scan_cooldown(&self) -> Duration {
        Duration::from_secs(self.scan_cooldown_secs.unwrap_or(DEFAULT_SCAN_COOLDOWN_SECS))
    }

    /// Where the database lives: the CLI flag, then `$INTAKE_HOME`, then
    /// the config file, then the platform data dir.
    pub(crate) fn resolve_data_dir(&self, cli_dir: Option<&Path>) -> Option<PathBuf> {
        if let Some(dir) = cli_dir {
            return Some(dir.to_path_buf());
        }
        if let Some(home) = std::env::var_os(HOME_ENV) {
            return Some(PathBuf::from(home));
        }
        if let Some(dir) = &self.data_dir {
            return Some(dir.clone());
        }
        dirs::data_dir().map(|d| d.join(APP_DIR))
    }
}
