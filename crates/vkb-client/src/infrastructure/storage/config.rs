//! TOML-based configuration persistence.
//!
//! Reads `AppConfig` from the platform-appropriate config file, creating it
//! with the defaults on first start:
//! - Windows:  `%APPDATA%\VirtualKeyboard\config.toml`
//! - Linux:    `~/.config/vkb/config.toml`
//! - macOS:    `~/Library/Application Support/VirtualKeyboard/config.toml`
//!
//! The same directory holds the calibration files unless `storage.data_dir`
//! points elsewhere.  Example:
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [playback]
//! countdown_secs = 3
//! char_delay_secs = 0.04
//!
//! [calibration]
//! warmup_ms = 400
//! settle_before_ms = 30
//! settle_after_ms = 60
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section or a
//! missing key all fall back to the values above.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use vkb_core::{PlaybackSettings, SettingsError};

use crate::application::calibrate_keyboard::CalibrationTiming;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Playback defaults applied when the operator gives no explicit values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackConfig {
    /// Whole seconds to count down before typing.
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u32,
    /// Pause after each character, in seconds.
    #[serde(default = "default_char_delay_secs")]
    pub char_delay_secs: f64,
}

/// Settle delays around each calibration attempt, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalibrationConfig {
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,
    #[serde(default = "default_settle_before_ms")]
    pub settle_before_ms: u64,
    #[serde(default = "default_settle_after_ms")]
    pub settle_after_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StorageConfig {
    /// Overrides the directory holding calibration files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_countdown_secs() -> u32 {
    3
}
fn default_char_delay_secs() -> f64 {
    0.04
}
fn default_warmup_ms() -> u64 {
    400
}
fn default_settle_before_ms() -> u64 {
    30
}
fn default_settle_after_ms() -> u64 {
    60
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            countdown_secs: default_countdown_secs(),
            char_delay_secs: default_char_delay_secs(),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            warmup_ms: default_warmup_ms(),
            settle_before_ms: default_settle_before_ms(),
            settle_after_ms: default_settle_after_ms(),
        }
    }
}

impl AppConfig {
    /// Playback settings from the `[playback]` section.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if `char_delay_secs` is negative or not finite.
    pub fn playback_settings(&self) -> Result<PlaybackSettings, SettingsError> {
        PlaybackSettings::from_secs(self.playback.countdown_secs, self.playback.char_delay_secs)
    }

    /// Calibration timing from the `[calibration]` section.
    pub fn calibration_timing(&self) -> CalibrationTiming {
        CalibrationTiming {
            warmup: Duration::from_millis(self.calibration.warmup_ms),
            settle_before: Duration::from_millis(self.calibration.settle_before_ms),
            settle_after: Duration::from_millis(self.calibration.settle_after_ms),
        }
    }

    /// Directory for calibration files: the configured override, or the
    /// platform config directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoPlatformConfigDir`] when there is no override
    /// and the platform directory cannot be determined.
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => config_dir(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Loads the platform config file, writing the defaults there first if it
/// does not exist yet so the operator has a file to edit.
///
/// # Errors
///
/// See [`init_config_at`].
pub fn init_config() -> Result<AppConfig, ConfigError> {
    init_config_at(&config_file_path()?)
}

/// Loads `AppConfig` from `path`; when the file is missing, saves
/// `AppConfig::default()` to it and returns the defaults.
///
/// # Errors
///
/// Returns the [`load_config_from`] errors for an existing file and the
/// [`save_config_to`] errors when the defaults cannot be written.
pub fn init_config_at(path: &Path) -> Result<AppConfig, ConfigError> {
    if path.exists() {
        return load_config_from(path);
    }
    let config = AppConfig::default();
    save_config_to(&config, path)?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(config)
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config directory, including the application folder.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("VirtualKeyboard"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("vkb"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("VirtualKeyboard")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
