//! Engine configuration, read from `quest-engine.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{QuestError, Result};
use crate::quest::registry::{QuestRegistry, RegistryBuilder};
use crate::quest::starter;

/// Environment variable pointing at an alternative config file
pub const CONFIG_ENV_VAR: &str = "QUEST_ENGINE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "quest-engine.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding `quests/**/*.toml`
    pub data_dir: PathBuf,
    /// Quest handed out by bootstrap
    pub root_quest: String,
    /// Watch quest files and re-link on change
    pub hot_reload: bool,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            root_quest: starter::ROOT_QUEST.to_string(),
            hot_reload: cfg!(debug_assertions),
            log_filter: "starter_quest=info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load from `$QUEST_ENGINE_CONFIG`, falling back to `quest-engine.toml`.
    ///
    /// A missing default file yields the defaults; a missing file named by
    /// the environment variable is an error.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| QuestError::Config(format!("Failed to read {:?}: {}", path, e)))?;
        toml::from_str(&content).map_err(|source| QuestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Built-in starter chain plus any quest files, linked
    pub fn build_registry(&self) -> Result<QuestRegistry> {
        let mut builder = RegistryBuilder::new();
        starter::register(&mut builder);
        match builder.load_from_directory(&self.data_dir) {
            Ok(count) if count > 0 => info!("Added {} quests from {:?}", count, self.data_dir),
            Ok(_) => {}
            Err(e) => {
                warn!("Failed to load quest files from {:?}: {}", self.data_dir, e);
                return Err(e);
            }
        }
        builder.root(&self.root_quest);
        builder.link()
    }
}
