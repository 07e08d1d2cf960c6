use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunables for an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)] // partial config files fill the rest from defaults
pub struct EditorConfig {
    /// Quiet period after the last change before the scene is written
    pub save_debounce_ms: u64,
    /// Total padding (both sides) subtracted from the container before fitting
    pub viewport_padding: f32,
    /// Fraction of the target bounds left as margin on each side of a new crop overlay
    pub crop_inset: f32,
    /// Relative tolerance for aspect-ratio constrained crops
    pub aspect_tolerance: f32,
    /// Smallest crop region, in logical pixels
    pub min_crop_size: f32,
    pub default_background: String,
    /// Where `JsonFileStore` keeps project records
    pub state_dir: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: 2000,
            viewport_padding: 40.0,
            crop_inset: 0.1,
            aspect_tolerance: 0.01,
            min_crop_size: 2.0,
            default_background: "#ffffff".to_owned(),
            state_dir: PathBuf::from("projects"),
        }
    }
}

impl EditorConfig {
    /// Load a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}
