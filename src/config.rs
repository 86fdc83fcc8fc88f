//! Configuration system for absim
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (ABSIM_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Main simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Vision backend settings (image description)
    pub vision: VisionSettings,

    /// Evaluation pipeline settings
    pub evaluation: EvaluationSettings,

    /// Logging configuration
    pub logging: LoggingSettings,

    /// Result storage paths
    pub storage: StorageSettings,
}

/// Vision backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    /// Backend to use: "openai" or "mock"
    pub backend: String,

    /// API base URL (e.g., "https://api.openai.com/v1")
    pub base_url: String,

    /// API key (falls back to OPENAI_API_KEY when empty)
    pub api_key: String,

    /// Vision-capable model identifier
    pub model: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Total retry window for transient failures in seconds
    pub retry_max_elapsed_secs: u64,
}

/// Evaluation pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationSettings {
    /// Maximum persona evaluations running at once
    pub max_concurrent_evaluations: usize,

    /// Whole-run timeout in seconds
    pub run_timeout_secs: u64,

    /// Relative score gap (percent) required for significance
    pub significance_threshold_pct: f64,

    /// Minimum successful verdicts per variant for significance
    pub min_sample_count: usize,

    /// Per-persona score delta that triggers a recommendation
    pub delta_threshold: f64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

/// Storage path settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory where test reports are written
    pub output_dir: String,
}

// Default implementations

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            vision: VisionSettings::default(),
            evaluation: EvaluationSettings::default(),
            logging: LoggingSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            backend: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
            retry_max_elapsed_secs: 30,
        }
    }
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            max_concurrent_evaluations: 4,
            run_timeout_secs: 300,
            significance_threshold_pct: 10.0,
            min_sample_count: 2,
            delta_threshold: 15.0,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            output_dir: "~/.absim/results".to_string(),
        }
    }
}

impl SimConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        let config_file = Self::find_config_file(config_path)?;
        if let Some(path) = config_file {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path).map_err(|e| Error::IoRead {
                path: path.clone(),
                source: e,
            })?;
            config = toml::from_str(&content).map_err(|e| Error::ConfigParse {
                message: e.to_string(),
            })?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let expanded = shellexpand::tilde(path);
            let path = PathBuf::from(expanded.as_ref());
            if path.exists() {
                return Ok(Some(path));
            } else {
                return Err(Error::ConfigNotFound { path });
            }
        }

        // Search in standard locations
        let search_paths = [
            // Current directory
            PathBuf::from("absim.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("absim").join("config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".absim").join("config.toml"))
                .unwrap_or_default(),
            // System config (Linux)
            PathBuf::from("/etc/absim/config.toml"),
        ];

        for path in &search_paths {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Vision settings
        if let Ok(val) = std::env::var("ABSIM_VISION_BACKEND") {
            self.vision.backend = val;
        }
        if let Ok(val) = std::env::var("ABSIM_VISION_BASE_URL") {
            self.vision.base_url = val;
        }
        if let Ok(val) = std::env::var("ABSIM_VISION_API_KEY") {
            self.vision.api_key = val;
        }
        // Common convention fallback when no absim-specific key is set
        if self.vision.api_key.is_empty() {
            if let Ok(val) = std::env::var("OPENAI_API_KEY") {
                self.vision.api_key = val;
            }
        }
        if let Ok(val) = std::env::var("ABSIM_VISION_MODEL") {
            self.vision.model = val;
        }
        if let Ok(val) = std::env::var("ABSIM_VISION_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.vision.timeout_secs = n;
            }
        }
        if let Ok(val) = std::env::var("ABSIM_VISION_RETRY_SECS") {
            if let Ok(n) = val.parse() {
                self.vision.retry_max_elapsed_secs = n;
            }
        }

        // Evaluation settings
        if let Ok(val) = std::env::var("ABSIM_MAX_CONCURRENT") {
            if let Ok(n) = val.parse() {
                self.evaluation.max_concurrent_evaluations = n;
            }
        }
        if let Ok(val) = std::env::var("ABSIM_RUN_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.evaluation.run_timeout_secs = n;
            }
        }
        if let Ok(val) = std::env::var("ABSIM_SIGNIFICANCE_THRESHOLD") {
            if let Ok(n) = val.parse() {
                self.evaluation.significance_threshold_pct = n;
            }
        }
        if let Ok(val) = std::env::var("ABSIM_MIN_SAMPLES") {
            if let Ok(n) = val.parse() {
                self.evaluation.min_sample_count = n;
            }
        }
        if let Ok(val) = std::env::var("ABSIM_DELTA_THRESHOLD") {
            if let Ok(n) = val.parse() {
                self.evaluation.delta_threshold = n;
            }
        }

        // Logging settings
        if let Ok(val) = std::env::var("ABSIM_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("ABSIM_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("ABSIM_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }

        // Storage settings
        if let Ok(val) = std::env::var("ABSIM_OUTPUT_DIR") {
            self.storage.output_dir = val;
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        self.storage.output_dir = expand_path(&self.storage.output_dir);

        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate vision backend
        let valid_backends = ["openai", "mock"];
        if !valid_backends.contains(&self.vision.backend.to_lowercase().as_str()) {
            return Err(Error::Config(format!(
                "Invalid vision backend '{}'. Must be one of: {}",
                self.vision.backend,
                valid_backends.join(", ")
            )));
        }

        if self.vision.base_url.is_empty() {
            return Err(Error::Config("Vision base URL cannot be empty".to_string()));
        }

        // Validate evaluation settings
        if self.evaluation.max_concurrent_evaluations == 0 {
            return Err(Error::Config(
                "max_concurrent_evaluations must be at least 1".to_string(),
            ));
        }
        if self.evaluation.min_sample_count == 0 {
            return Err(Error::Config(
                "min_sample_count must be at least 1".to_string(),
            ));
        }
        if self.evaluation.significance_threshold_pct < 0.0 {
            return Err(Error::Config(
                "significance_threshold_pct cannot be negative".to_string(),
            ));
        }
        if self.evaluation.delta_threshold < 0.0 {
            return Err(Error::Config(
                "delta_threshold cannot be negative".to_string(),
            ));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<()> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".absim")
                .join("config.toml")
        });

    // Check if file exists
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    // Create parent directories
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
    }

    // Generate default config with comments
    let config_content = generate_default_config();

    // Write the file
    fs::write(&config_path, config_content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

    println!("Configuration file created: {}", config_path.display());
    Ok(())
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# absim configuration
# https://github.com/absim/absim

[vision]
# Backend used to describe images: "openai" or "mock"
backend = "openai"

# API base URL (OpenAI or any compatible endpoint)
base_url = "https://api.openai.com/v1"

# API key (leave empty to use the OPENAI_API_KEY environment variable)
api_key = ""

# Vision-capable model identifier
model = "gpt-4o-mini"

# Per-request timeout in seconds
timeout_secs = 60

# Total retry window for transient failures in seconds
retry_max_elapsed_secs = 30

[evaluation]
# Maximum persona evaluations running at once
max_concurrent_evaluations = 4

# Whole-run timeout in seconds
run_timeout_secs = 300

# Relative score gap (percent) required for statistical significance
significance_threshold_pct = 10.0

# Minimum successful verdicts per variant for significance
min_sample_count = 2

# Per-persona score delta that triggers a recommendation
delta_threshold = 15.0

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.absim/logs/absim.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 100

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false

[storage]
# Directory where test reports are written
output_dir = "~/.absim/results"
"#
    .to_string()
}
