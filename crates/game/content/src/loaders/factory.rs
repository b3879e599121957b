//! Content factory for locating and loading battle files.

use std::path::{Path, PathBuf};

use tinydeck_core::{BattleConfig, BattleSetup};

use crate::loaders::{ConfigLoader, LoadResult};

/// Content factory that loads battle content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── battle.toml     (preferred)
/// └── config.toml     (fallback)
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// File names searched by [`ContentFactory::locate`], in order.
    pub const CONFIG_FILES: [&'static str; 2] = ["battle.toml", "config.toml"];

    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Finds the battle configuration file in the data directory.
    pub fn locate(&self) -> LoadResult<PathBuf> {
        Self::CONFIG_FILES
            .iter()
            .map(|name| self.data_dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No battle config found in {} (looked for {})",
                    self.data_dir.display(),
                    Self::CONFIG_FILES.join(", ")
                )
            })
    }

    /// Load the battle configuration found by [`ContentFactory::locate`].
    pub fn load_config(&self) -> LoadResult<BattleConfig> {
        let path = self.locate()?;
        ConfigLoader::load(&path)
    }

    /// Load and validate the battle configuration.
    pub fn load_setup(&self) -> LoadResult<BattleSetup> {
        let path = self.locate()?;
        ConfigLoader::load_setup(&path)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
