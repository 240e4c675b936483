use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{LaneError, Result};

pub const LANE_DIR: &str = ".worklane";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneConfig {
    pub store: StoreConfig,
    pub engine: EngineConfig,
}

impl LaneConfig {
    pub async fn load(lane_dir: &Path) -> Result<Self> {
        let config_path = lane_dir.join(CONFIG_FILE);
        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, lane_dir: &Path) -> Result<()> {
        self.validate()?;
        let config_path = lane_dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self).map_err(|e| LaneError::Config(e.to_string()))?;
        fs::write(&config_path, content).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.store.db_file.is_empty() {
            errors.push("store.db_file must not be empty");
        }
        if self.engine.prd_threshold_chars == 0 {
            errors.push("engine.prd_threshold_chars must be greater than 0");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(LaneError::Config(errors.join("; ")))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file name inside the workspace directory.
    pub db_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_file: "worklane.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Accumulated conversation length at which discovery produces a PRD.
    pub prd_threshold_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prd_threshold_chars: 100,
        }
    }
}

/// Filesystem layout of an initialized workspace.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub lane_dir: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let lane_dir = root.join(LANE_DIR);
        Self { root, lane_dir }
    }

    pub fn db_path(&self, config: &LaneConfig) -> PathBuf {
        self.lane_dir.join(&config.store.db_file)
    }

    pub fn is_initialized(&self) -> bool {
        self.lane_dir.exists()
    }

    pub async fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.lane_dir).await?;
        Ok(())
    }
}
