// Configuration Storage Service
// Handles config file read/write and version backup

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::LabelThresholds;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_min_response_chars")]
    pub min_response_chars: usize,
    #[serde(default)]
    pub detector: DetectorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            data_dir: default_data_dir(),
            min_response_chars: default_min_response_chars(),
            detector: DetectorConfig::default(),
        }
    }
}

/// Heuristic weights and phrase list used to build a `HallucinationDetector`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorConfig {
    #[serde(default = "default_uncertainty_phrases")]
    pub uncertainty_phrases: Vec<String>,
    #[serde(default = "default_uncertainty_weight")]
    pub uncertainty_weight: f64,
    #[serde(default = "default_numeric_weight")]
    pub numeric_weight: f64,
    #[serde(default = "default_short_weight")]
    pub short_response_weight: f64,
    /// Normalized responses with fewer characters than this count as short.
    #[serde(default = "default_short_chars")]
    pub short_response_chars: usize,
    #[serde(default)]
    pub thresholds: LabelThresholds,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            uncertainty_phrases: default_uncertainty_phrases(),
            uncertainty_weight: 0.4,
            numeric_weight: 0.2,
            short_response_weight: 0.3,
            short_response_chars: 30,
            thresholds: LabelThresholds::default(),
        }
    }
}

pub const DEFAULT_UNCERTAINTY_PHRASES: [&str; 8] = [
    "i think",
    "it seems",
    "possibly",
    "might be",
    "not sure",
    "approximately",
    "around",
    "estimated",
];

fn default_version() -> String { env!("CARGO_PKG_VERSION").to_string() }
fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_min_response_chars() -> usize { 10 }
fn default_uncertainty_phrases() -> Vec<String> {
    DEFAULT_UNCERTAINTY_PHRASES.iter().map(|p| p.to_string()).collect()
}
fn default_uncertainty_weight() -> f64 { 0.4 }
fn default_numeric_weight() -> f64 { 0.2 }
fn default_short_weight() -> f64 { 0.3 }
fn default_short_chars() -> usize { 30 }

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Store backed by an explicit config file path.
    pub fn from_file(config_file: PathBuf) -> Self {
        let config_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("hallucination-tracker"))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir).map_err(|e| ConfigError::io("create dir for", e))
    }

    /// Load configuration from file
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content =
            fs::read_to_string(&self.config_file).map_err(|e| ConfigError::io("read", e))?;

        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        self.ensure_dir()?;

        // Create backup if file exists
        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)?;

        fs::write(&self.config_file, content).map_err(|e| ConfigError::io("write", e))
    }

    /// Create a backup of current config
    fn create_backup(&self) -> Result<(), ConfigError> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir).map_err(|e| ConfigError::io("create backup dir for", e))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file).map_err(|e| ConfigError::io("back up", e))?;

        // Keep only last 10 backups
        self.cleanup_old_backups(&backup_dir, 10)?;

        Ok(())
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), ConfigError> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(|e| ConfigError::io("list backups of", e))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Oldest first; file names embed the timestamp so ties break by name.
        entries.sort_by_key(|e| {
            let modified = e
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
            (modified, e.file_name())
        });

        let remove_count = entries.len() - keep;
        for entry in entries.iter().take(remove_count) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }

    /// Replace the detector section and persist
    pub fn set_detector(&self, detector: DetectorConfig) -> Result<(), ConfigError> {
        let mut config = self.load()?;
        config.detector = detector;
        self.save(&config)
    }
}
