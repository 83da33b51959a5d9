use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::db::schema::SchemaVersion;

/// Application configuration loaded from TOML config file.
/// The config file is optional; every field has a default.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Engine Library directory holding `m.db` and `p.db`.
    pub library_dir: Option<PathBuf>,
    /// Schema version used by `create` when none is given, e.g. "1.18.0".
    pub schema_version: Option<String>,
}

impl AppConfig {
    /// Load config from the platform config dir (`~/.config/enginelib/config.toml`
    /// on Linux). Returns defaults if the file doesn't exist and logs a warning
    /// if it exists but can't be read or parsed.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match Self::parse(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<AppConfig>(contents)
    }

    /// Schema version for new libraries: config value if it names a supported
    /// version, otherwise the latest.
    pub fn resolve_schema_version(&self) -> SchemaVersion {
        match self.schema_version.as_deref().map(str::parse::<SchemaVersion>) {
            Some(Ok(version)) => version,
            Some(Err(e)) => {
                log::warn!("{e} in config, using {}", SchemaVersion::LATEST);
                SchemaVersion::LATEST
            }
            None => SchemaVersion::LATEST,
        }
    }

    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Default library directory under the platform data directory.
pub fn default_library_dir() -> PathBuf {
    if let Some(dirs) = ProjectDirs::from("", "", crate::APP_NAME) {
        dirs.data_dir().join("Engine Library")
    } else {
        // Fallback: current directory
        PathBuf::from("Engine Library")
    }
}
