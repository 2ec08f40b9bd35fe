//! Application configuration
//!
//! RON file with window, renderer and viewer settings. Every section falls
//! back to its defaults when omitted.

use std::path::{Path, PathBuf};

use meshview_core::ViewerSettings;
use meshview_renderer::RendererConfig;
use serde::{Deserialize, Serialize};

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "meshview.ron";

/// Configuration error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Deserialization error: {0}")]
    Deserialize(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("{0}\nusage: meshview [--config <file.ron>] [mesh.obj|mesh.stl]")]
    Usage(String),
}

/// Initial window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            title: "Mesh Viewer".to_string(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    /// Configuration format version
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub viewer: ViewerSettings,
}

impl AppConfig {
    /// Current configuration version
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            ..Default::default()
        }
    }

    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Loads an explicitly requested file. A missing file is an error.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_ron(&content)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Loads `path` if given, otherwise [`DEFAULT_CONFIG_FILE`] when it
    /// exists, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::load_from_path(default_path)
        } else {
            tracing::info!("No config file found, using defaults");
            Ok(Self::new())
        }
    }
}

/// Command line: `meshview [--config <file>] [mesh]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub mesh: Option<PathBuf>,
}

impl CliArgs {
    /// Parses arguments without the program name.
    pub fn parse<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            if arg == "--config" || arg == "-c" {
                let path = args
                    .next()
                    .ok_or_else(|| ConfigError::Usage(format!("{} needs a file", arg)))?;
                parsed.config = Some(PathBuf::from(path));
            } else if let Some(path) = arg.strip_prefix("--config=") {
                parsed.config = Some(PathBuf::from(path));
            } else if arg.starts_with('-') {
                return Err(ConfigError::Usage(format!("unknown option '{}'", arg)));
            } else if parsed.mesh.is_none() {
                parsed.mesh = Some(PathBuf::from(arg));
            } else {
                return Err(ConfigError::Usage(format!("unexpected argument '{}'", arg)));
            }
        }

        Ok(parsed)
    }

    /// Applies command line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(mesh) = &self.mesh {
            config.viewer.assets.mesh = mesh.clone();
        }
    }
}
