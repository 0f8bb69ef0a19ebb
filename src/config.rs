use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::logging::LogConfig;

/// Directory under the home directory holding config and data
const APP_DIR: &str = ".marathon-log";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Where the slot database lives
    #[serde(default)]
    pub storage: StorageSettings,

    /// Logging setup
    #[serde(default)]
    pub logging: LogConfig,

    /// Presentation defaults
    #[serde(default)]
    pub display: DisplaySettings,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Slot storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite database file holding the slots
    pub data_file: PathBuf,
}

/// Presentation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Runs listed on the dashboard
    pub recent_runs_limit: usize,

    /// Rows per page in run history
    pub history_page_size: usize,

    /// Colored terminal output
    pub color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            storage: StorageSettings::default(),
            logging: LogConfig::default(),
            display: DisplaySettings::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            data_file: app_dir().join("marathon-log.db"),
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            recent_runs_limit: 5,
            history_page_size: 10,
            color: true,
        }
    }
}

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        debug!(path = %path.as_ref().display(), "Configuration saved");
        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        app_dir().join("config.toml")
    }

    /// Load configuration from `path` (or the default location), falling
    /// back to defaults when the file is missing or unreadable
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Self::default();
        }

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "Unreadable config, using defaults");
                Self::default()
            }
        }
    }

    /// Make sure the slot database directory exists and return the file path
    pub fn prepare_data_file(&self) -> Result<PathBuf> {
        let path = self.storage.data_file.clone();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
        }
        Ok(path)
    }
}
