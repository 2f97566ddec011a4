use anyhow::Result;
use clap::Parser;
use character_core::MetaKey;
use console::style;
use roster::CharacterRepository;

use super::{Session, choices};

/// Set a meta attribute (Class, Profession, Race, Class level, Profession level)
#[derive(Parser, Debug)]
pub struct SetMeta {
    /// Character name
    name: String,

    /// Attribute name, e.g. "Class level"
    key: String,

    /// New value
    value: String,

    /// Answer for a tier choice, in order (repeatable); asks on the terminal when omitted
    #[arg(long = "choose", value_name = "NAME")]
    choices: Vec<String>,
}

impl SetMeta {
    pub fn execute(self, session: &Session) -> Result<()> {
        let mut character = session.character(&self.name)?;
        let mut chooser = choices(&self.choices);
        character.set_meta(&session.tables, &self.key, &self.value, chooser.as_mut())?;
        session.roster.save(&character)?;

        let key = MetaKey::lookup(&self.key)?;
        println!(
            "{} {key}: {}",
            style("✓").green().bold(),
            character.meta(key).unwrap_or_else(|| "-".to_string())
        );
        Ok(())
    }
}
