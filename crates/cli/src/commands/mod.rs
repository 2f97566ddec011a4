//! Command implementations.
//!
//! Each command is a separate module that implements its own CLI args and
//! execution logic against a shared [`Session`].

mod allocate;
mod create;
mod delete;
mod import_sheet;
mod level_up;
mod list;
mod set_meta;
mod show;
mod validate;

pub use allocate::Allocate;
pub use create::Create;
pub use delete::Delete;
pub use import_sheet::ImportSheet;
pub use level_up::LevelUp;
pub use list::List;
pub use set_meta::SetMeta;
pub use show::Show;
pub use validate::Validate;

use anyhow::{Context, Result};
use character_content::{ConfigLoader, ContentFactory, TablesLoader};
use character_core::{
    Character, EngineConfig, ProgressionTables, ScriptedChoices, TierChoiceProvider,
};
use roster::{CharacterRepository, FileRoster};

use crate::config::CliConfig;
use crate::prompt::StdinChoices;

/// Content and storage shared by every command.
pub struct Session {
    pub engine: EngineConfig,
    pub tables: ProgressionTables,
    pub roster: FileRoster,
    pub content: Option<ContentFactory>,
}

impl Session {
    pub fn open(config: &CliConfig) -> Result<Self> {
        let content = config.content_dir.as_ref().map(ContentFactory::new);
        let (engine, tables) = match &content {
            Some(factory) => (factory.load_config()?, factory.load_tables()?),
            None => (ConfigLoader::bundled()?, TablesLoader::bundled()?),
        };
        let roster = FileRoster::new(&config.roster_path)
            .with_context(|| format!("Failed to open roster {}", config.roster_path.display()))?
            .with_curve(engine.modifier);

        tracing::debug!(roster = %config.roster_path.display(), "session opened");
        Ok(Self {
            engine,
            tables,
            roster,
            content,
        })
    }

    /// Loads a stored character or fails with a readable message.
    pub fn character(&self, name: &str) -> Result<Character> {
        self.roster
            .load(name)?
            .with_context(|| format!("No character named '{name}' in the roster"))
    }
}

/// Scripted answers when given, otherwise ask on the terminal.
pub(crate) fn choices(answers: &[String]) -> Box<dyn TierChoiceProvider> {
    if answers.is_empty() {
        Box::new(StdinChoices)
    } else {
        Box::new(ScriptedChoices::new(answers.iter().cloned()))
    }
}
