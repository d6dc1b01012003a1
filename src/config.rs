// File: src/config.rs
use crate::error::ConfigError;
use crate::mission::DEFAULT_SESSION_SIZE;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "gre-starnet";
const DEFAULT_DATASET: &str = "star_data.json";

#[derive(Debug, Default, Deserialize)]
pub struct StarConfig {
    pub data: Option<DataConfig>,
    pub session: Option<SessionConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DataConfig {
    pub dataset: Option<PathBuf>,
    pub progress: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionConfig {
    pub size: Option<usize>,
    pub seed: Option<u64>,
}

impl StarConfig {
    /// Reads the user config. A missing or broken file yields defaults.
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::from_path(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Failed to load config at {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.data
            .as_ref()
            .and_then(|d| d.dataset.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET))
    }

    pub fn progress_path(&self) -> PathBuf {
        self.data
            .as_ref()
            .and_then(|d| d.progress.clone())
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join(APP_DIR).join("progress.bin")))
            .unwrap_or_else(|| PathBuf::from("progress.bin"))
    }

    pub fn session_size(&self) -> usize {
        self.session
            .as_ref()
            .and_then(|s| s.size)
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_SESSION_SIZE)
    }

    pub fn session_seed(&self) -> Option<u64> {
        self.session.as_ref().and_then(|s| s.seed)
    }
}
