use std::io::{self, Write};

use anyhow::Result;
use clap::Parser;
use console::style;
use roster::CharacterRepository;

use super::Session;

/// Delete a character from the roster
#[derive(Parser, Debug)]
pub struct Delete {
    /// Character name (case-insensitive)
    name: String,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,
}

impl Delete {
    pub fn execute(self, session: &Session) -> Result<()> {
        if !self.yes {
            print!("Delete '{}'? [y/N] ", self.name);
            io::stdout().flush()?;
            let mut answer = String::new();
            io::stdin().read_line(&mut answer)?;
            if !answer.trim().eq_ignore_ascii_case("y") {
                println!("{}", style("Cancelled").dim());
                return Ok(());
            }
        }

        if session.roster.delete(&self.name)? {
            println!("{} Deleted {}", style("✓").green().bold(), style(&self.name).cyan());
        } else {
            println!("{} No character named {}", style("✗").red().bold(), self.name);
        }
        Ok(())
    }
}
