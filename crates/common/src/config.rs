//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where exported images are written.
    pub output_dir: PathBuf,

    /// Font discovery settings.
    #[serde(default)]
    pub fonts: FontConfig,

    /// Default canvas settings used to seed a new render request.
    #[serde(default)]
    pub canvas: CanvasDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where font files are looked up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontConfig {
    /// Directories scanned for `.ttf`/`.otf` files.
    pub dirs: Vec<PathBuf>,

    /// Family used when the requested one has no registered face.
    pub fallback_family: String,
}

/// Default canvas parameters, in logical (display) pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasDefaults {
    pub width: u32,
    pub padding: f64,
    pub max_font_size: f64,
    pub min_font_size: f64,
    pub font_family: String,
    pub background_color: String,
    pub text_color: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "kotak_render=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: dirs_default_output(),
            fonts: FontConfig::default(),
            canvas: CanvasDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            dirs: dirs_default_fonts(),
            fallback_family: "DejaVu Sans".to_string(),
        }
    }
}

impl Default for CanvasDefaults {
    fn default() -> Self {
        Self {
            width: 240,
            padding: 24.0,
            max_font_size: 42.0,
            min_font_size: 14.0,
            font_family: "Arial".to_string(),
            background_color: "#ffffff".to_string(),
            text_color: "#000000".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    base.join("kotakkata").join("config.json")
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string()))
}

/// Default export directory.
fn dirs_default_output() -> PathBuf {
    let base = std::env::var("XDG_PICTURES_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join("Pictures"));
    base.join("kotakkata")
}

/// System and user font directories.
fn dirs_default_fonts() -> Vec<PathBuf> {
    vec![
        home_dir().join(".local").join("share").join("fonts"),
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
    ]
}
