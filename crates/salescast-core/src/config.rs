use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SalescastError};

/// Top-level configuration for the Salescast client.
///
/// Loaded from `~/.salescast/config.toml` by default. Every section is
/// optional; missing sections and keys fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalescastConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl SalescastConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SalescastConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SalescastError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Directory where downloaded reports are written.
    pub output_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            output_dir: "reports".to_string(),
        }
    }
}

/// Remote forecast service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the forecast service, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds. Report generation can be slow.
    pub timeout_secs: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://harideeshab-pharma-sales-api.hf.space".to_string(),
            timeout_secs: 300,
            user_agent: concat!("salescast/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Default per-entry read limit: 64 MiB.
pub const DEFAULT_MAX_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// Archive entry classification markers.
///
/// Markers are matched as case-insensitive substrings of the entry name,
/// extensions as case-insensitive suffixes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Extensions (without the dot) treated as images.
    pub image_extensions: Vec<String>,
    /// Extensions (without the dot) treated as tables.
    pub table_extensions: Vec<String>,
    /// Marker of the custom-range forecast table.
    pub custom_forecast_marker: String,
    /// Marker of the historical detail report.
    pub historical_summary_marker: String,
    /// Marker of the forecast detail report.
    pub forecast_summary_marker: String,
    /// Marker of the full forecast dataset.
    pub forecast_data_marker: String,
    /// Marker of the historical raw dataset.
    pub historical_data_marker: String,
    /// Largest uncompressed size read from a single entry, in bytes.
    pub max_entry_bytes: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            image_extensions: ["png", "jpg", "jpeg", "gif", "webp", "svg"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            table_extensions: vec!["csv".to_string()],
            custom_forecast_marker: "forecast_custom_date".to_string(),
            historical_summary_marker: "detailed_summary_report".to_string(),
            forecast_summary_marker: "forecast_summary_report".to_string(),
            forecast_data_marker: "full_forecast_data".to_string(),
            historical_data_marker: "historical_raw_data".to_string(),
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
        }
    }
}

/// Conversational assistant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Whether the assistant may be queried at all.
    pub enabled: bool,
    /// Maximum question length in characters.
    pub max_question_length: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_question_length: 2000,
        }
    }
}
