//! Configuration file handling for photobooth.
//!
//! Loads configuration from `~/.config/photobooth/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration file structure for photobooth.
/// Loaded from ~/.config/photobooth/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub booth: BoothConfig,
    #[serde(default)]
    pub backgrounds: BackgroundsConfig,
    #[serde(default)]
    pub gallery: GalleryConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    /// Facing mode to start with: "front" or "back"
    #[serde(default)]
    pub facing: Option<String>,
    /// Mirror the front camera (selfie mode)
    #[serde(default = "default_true")]
    pub mirror: bool,
    /// Requested capture width
    #[serde(default)]
    pub width: Option<u32>,
    /// Requested capture height
    #[serde(default)]
    pub height: Option<u32>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing: None,
            mirror: true,
            width: None,
            height: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BoothConfig {
    /// Seconds the countdown starts from
    #[serde(default = "default_countdown")]
    pub countdown_seconds: u32,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            countdown_seconds: default_countdown(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct BackgroundsConfig {
    /// Directory holding the background images (beach.jpg, space.jpg, ...)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct GalleryConfig {
    /// Directory saved photos are written to
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct VoiceConfig {
    /// Enable the voice capture trigger
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

fn default_countdown() -> u32 {
    crate::session::COUNTDOWN_START
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("photobooth/config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/photobooth/config.toml")
        })
}
