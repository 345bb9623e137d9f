use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use paddock::{PaddockError, session::FIRST_SEASON};

const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_RACE_NAME: &str = "Belgium";
pub(crate) const LATEST_SEASON: u16 = 2025;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) data_dir: Option<PathBuf>,
    pub(crate) year: u16,
    pub(crate) race_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            year: FIRST_SEASON,
            race_name: DEFAULT_RACE_NAME.to_string(),
        }
    }
}

impl AppConfig {
    fn config_path() -> Result<PathBuf, PaddockError> {
        Ok(dirs::config_dir()
            .ok_or(PaddockError::NoConfigDir)?
            .join("paddock")
            .join(CONFIG_FILE_NAME))
    }

    pub(crate) fn from_local_file() -> Option<Self> {
        let config_path = Self::config_path().ok()?;
        Self::from_file(&config_path)
    }

    pub(crate) fn from_file(config_path: &Path) -> Option<Self> {
        if !config_path.exists() {
            return None;
        }
        let file = std::fs::File::open(config_path)
            .map_err(|e| warn!("Could not open config file {:?}: {}", config_path, e))
            .ok()?;
        serde_json::from_reader(file)
            .map_err(|e| warn!("Could not parse config file {:?}: {}", config_path, e))
            .ok()
    }

    pub(crate) fn save(&self) -> Result<(), PaddockError> {
        self.save_to(&Self::config_path()?)
    }

    pub(crate) fn save_to(&self, config_path: &Path) -> Result<(), PaddockError> {
        if let Some(parent) = config_path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| PaddockError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| PaddockError::ConfigIOError { source: e })?;
        serde_json::to_writer(file, self)
            .map_err(|e| PaddockError::ConfigSerializeError { source: e })
    }
}
