use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use todu_health_core::MAX_PERIODS;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

pub const DEFAULT_DEBOUNCE_MS: u64 = 120;
pub const DEFAULT_WEEKLY_PERIODS: usize = 8;
pub const DEFAULT_MONTHLY_PERIODS: usize = 6;

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding activities.json and metrics.json
    pub data_dir: ConfigValue<PathBuf>,
    /// Search debounce in milliseconds
    pub debounce_ms: ConfigValue<u64>,
    pub weekly_periods: ConfigValue<usize>,
    pub monthly_periods: ConfigValue<usize>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal structs for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    search: SearchSection,
    trends: TrendsSection,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SearchSection {
    debounce_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TrendsSection {
    weekly_periods: Option<usize>,
    monthly_periods: Option<usize>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut debounce_ms = ConfigValue::new(DEFAULT_DEBOUNCE_MS, ConfigSource::Default);
        let mut weekly_periods = ConfigValue::new(DEFAULT_WEEKLY_PERIODS, ConfigSource::Default);
        let mut monthly_periods =
            ConfigValue::new(DEFAULT_MONTHLY_PERIODS, ConfigSource::Default);
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(ms) = file_config.search.debounce_ms {
                debounce_ms = ConfigValue::new(ms, ConfigSource::File);
            }
            if let Some(n) = file_config.trends.weekly_periods {
                let n = check_periods(&path, "trends.weekly_periods", n)?;
                weekly_periods = ConfigValue::new(n, ConfigSource::File);
            }
            if let Some(n) = file_config.trends.monthly_periods {
                let n = check_periods(&path, "trends.monthly_periods", n)?;
                monthly_periods = ConfigValue::new(n, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Ok(dir) = std::env::var("HEALTH_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(raw) = std::env::var("HEALTH_DEBOUNCE_MS") {
            let ms = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv("HEALTH_DEBOUNCE_MS", raw.clone()))?;
            debounce_ms = ConfigValue::new(ms, ConfigSource::Environment);
        }

        Ok(Self {
            data_dir,
            debounce_ms,
            weekly_periods,
            monthly_periods,
            config_file,
        })
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.value)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/health/
    /// - macOS: ~/Library/Application Support/health/
    /// - Windows: %APPDATA%/health/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("health")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/health/
    /// - macOS: ~/Library/Application Support/health/
    /// - Windows: %APPDATA%/health/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("health")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn check_periods(path: &Path, key: &'static str, n: usize) -> Result<usize, ConfigError> {
    if (1..=MAX_PERIODS).contains(&n) {
        Ok(n)
    } else {
        Err(ConfigError::OutOfRange(path.to_path_buf(), key, n))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidEnv(&'static str, String),
    OutOfRange(PathBuf, &'static str, usize),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidEnv(name, value) => {
                write!(f, "Invalid value '{}' for {}", value, name)
            }
            ConfigError::OutOfRange(path, key, value) => write!(
                f,
                "Invalid {} in '{}': {} (must be 1 to {})",
                key,
                path.display(),
                value,
                MAX_PERIODS
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
