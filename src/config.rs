//! Configuration for the behavior sentry agent.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration. All tunables of the capture/training/inference
/// pipeline live here; everything has a default suitable for a first run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Size of each feature window
    #[serde(with = "duration_serde")]
    pub window_size: Duration,

    /// Minimum span of history required to train a baseline
    #[serde(with = "duration_serde")]
    pub baseline_duration: Duration,

    /// Events older than this are removed by the retention sweep
    #[serde(with = "duration_serde")]
    pub retention_horizon: Duration,

    /// Assumed fraction of anomalous windows in the training span.
    /// The shipped default of 0.38 is deliberately preserved from the
    /// system this replaces; see DESIGN.md before "fixing" it.
    pub contamination: f64,

    /// Number of isolation trees in the ensemble
    pub tree_count: usize,

    /// How often the active-window poller runs
    #[serde(with = "duration_serde")]
    pub focus_poll_interval: Duration,

    /// How often CPU/memory get sampled
    #[serde(with = "duration_serde")]
    pub resource_sample_interval: Duration,

    /// Directory for the event log, model artifact and session stats
    pub data_path: PathBuf,

    /// Logging settings
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("behavior-sentry");

        Self {
            window_size: Duration::from_secs(30),
            baseline_duration: Duration::from_secs(10 * 60),
            retention_horizon: Duration::from_secs(15 * 60),
            contamination: 0.38,
            tree_count: 200,
            focus_poll_interval: Duration::from_secs(5),
            resource_sample_interval: Duration::from_secs(10),
            data_path: data_dir,
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("behavior-sentry")
            .join("config.json")
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    pub fn event_log_path(&self) -> PathBuf {
        self.data_path.join("events.sqlite")
    }

    pub fn model_path(&self) -> PathBuf {
        self.data_path.join("model.json")
    }

    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("stats.json")
    }

    pub fn window_size_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.window_size.as_secs() as i64)
    }

    pub fn baseline_duration_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.baseline_duration.as_secs() as i64)
    }

    /// Sanity-check tunables against each other.
    ///
    /// The retention horizon must outlast a window plus extraction slack or
    /// the sweep could delete rows an in-flight extraction still reads.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size.as_secs() == 0 {
            return Err(ConfigError::Invalid("window_size must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.contamination) {
            return Err(ConfigError::Invalid(
                "contamination must be in [0, 1)".into(),
            ));
        }
        if self.tree_count == 0 {
            return Err(ConfigError::Invalid("tree_count must be positive".into()));
        }
        let slack = Duration::from_secs(60);
        if self.retention_horizon < self.window_size + slack {
            return Err(ConfigError::Invalid(format!(
                "retention_horizon ({}s) must exceed window_size ({}s) plus {}s slack",
                self.retention_horizon.as_secs(),
                self.window_size.as_secs(),
                slack.as_secs()
            )));
        }
        Ok(())
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
