use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Configuration for a civiclog workspace.
///
/// This struct holds settings that control where requests are stored and how
/// the status predictor reaches its backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Directory holding persisted data, relative to the workspace root.
    storage_dir: PathBuf,

    /// Settings for the status predictor.
    pub predictor: PredictorConfig,
}

/// Settings for the generative-AI status predictor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Base URL of the generative language API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// The model to ask for a suggestion.
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// How long to wait for the backend before giving up.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Replaces the built-in turnaround-time reference text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_context: Option<String>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            historical_context: None,
        }
    }
}

impl PredictorConfig {
    /// The request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The reference text passed to the predictor alongside a description.
    #[must_use]
    pub fn historical_context(&self) -> &str {
        self.historical_context
            .as_deref()
            .unwrap_or(crate::predict::HISTORICAL_CITY_DATA)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            predictor: PredictorConfig::default(),
        }
    }
}

/// Errors reading or writing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid configuration TOML.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be rendered as TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads the configuration, falling back to defaults if the file is
    /// missing or unreadable.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::debug!("Failed to load config: {e}");
            Self::default()
        })
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The storage directory, resolved against the workspace root.
    #[must_use]
    pub fn storage_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.storage_dir)
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".civiclog").join("storage")
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_storage_dir")]
        storage_dir: PathBuf,

        #[serde(default)]
        predictor: PredictorConfig,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                storage_dir,
                predictor,
            } => Self {
                storage_dir,
                predictor,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            storage_dir: config.storage_dir,
            predictor: config.predictor,
        }
    }
}
