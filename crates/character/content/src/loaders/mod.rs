//! Content loaders for reading progression data from files.
//!
//! Each loader offers `load` (from a path), `parse` (from text) and, where
//! bundled data exists, `bundled`.

pub mod config;
pub mod factory;
pub mod sheet;
pub mod tables;

pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use sheet::{CharacterSheet, SheetLoader};
pub use tables::TablesLoader;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use character_core::{Stat, StatBlock};

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file {}", path.display()))
}

/// Converts a `stat name -> value` map into a block; absent stats are zero.
pub(crate) fn stat_block(values: &BTreeMap<String, i32>) -> LoadResult<StatBlock> {
    let mut block = StatBlock::ZERO;
    for (name, &value) in values {
        let stat = Stat::lookup(name)?;
        block[stat] = value;
    }
    Ok(block)
}
