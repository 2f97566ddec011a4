//! Content factory for building oracles from data files.

use std::path::{Path, PathBuf};

use character_core::{EngineConfig, ProgressionTables};

use crate::loaders::{CharacterSheet, ConfigLoader, LoadResult, SheetLoader, TablesLoader};

/// Content factory that loads all progression content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── tables.toml
/// └── sheets/
///     ├── ivy.ron
///     └── bram.ron
/// ```
///
/// Missing `config.toml` or `tables.toml` fall back to the bundled data.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load engine configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<EngineConfig> {
        let path = self.data_dir.join("config.toml");
        if path.exists() {
            ConfigLoader::load(&path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using bundled config");
            ConfigLoader::bundled()
        }
    }

    /// Load progression tables from `tables.toml`.
    pub fn load_tables(&self) -> LoadResult<ProgressionTables> {
        let path = self.data_dir.join("tables.toml");
        if path.exists() {
            TablesLoader::load(&path)
        } else {
            tracing::debug!(path = %path.display(), "no tables file, using bundled tables");
            TablesLoader::bundled()
        }
    }

    /// Load a sheet from `sheets/{name}.ron`.
    pub fn load_sheet(&self, name: &str) -> LoadResult<CharacterSheet> {
        let path = self.data_dir.join("sheets").join(format!("{name}.ron"));
        SheetLoader::load(&path)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
