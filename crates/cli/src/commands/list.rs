use anyhow::Result;
use clap::Parser;
use console::style;
use roster::CharacterRepository;

use super::Session;

/// List stored characters
#[derive(Parser, Debug)]
pub struct List {}

impl List {
    pub fn execute(self, session: &Session) -> Result<()> {
        let names = session.roster.list_names()?;
        if names.is_empty() {
            println!("{}", style("Roster is empty").dim());
        }
        for name in names {
            println!("{name}");
        }
        Ok(())
    }
}
