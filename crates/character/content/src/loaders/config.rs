//! Engine configuration loader.

use std::path::Path;

use anyhow::Context;
use character_core::EngineConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing keys fall back to [`EngineConfig::default`].
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("Invalid config at {}", path.display()))
    }

    /// Configuration shipped with the crate.
    pub fn bundled() -> LoadResult<EngineConfig> {
        Self::parse(crate::BUNDLED_CONFIG)
    }

    pub fn parse(content: &str) -> LoadResult<EngineConfig> {
        let config: EngineConfig =
            toml::from_str(content).context("Failed to parse config TOML")?;
        anyhow::ensure!(
            config.base_stat >= 0,
            "base_stat must not be negative, got {}",
            config.base_stat
        );
        Ok(config)
    }
}
