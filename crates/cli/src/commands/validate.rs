use anyhow::{Result, bail};
use clap::Parser;
use console::style;
use roster::CharacterRepository;

use super::Session;

/// Audit a stored character against its declared progression
#[derive(Parser, Debug)]
pub struct Validate {
    /// Character name
    name: String,

    /// Raise the free-point pool when the audit finds a shortfall, and save
    #[arg(long)]
    repair: bool,
}

impl Validate {
    pub fn execute(self, session: &Session) -> Result<()> {
        let mut character = session.character(&self.name)?;
        let report = if self.repair {
            let report = character.repair_free_points(&session.tables)?;
            if report.corrected_pool().is_some() {
                session.roster.save(&character)?;
                println!("{} free point pool repaired", style("!").yellow().bold());
            }
            report
        } else {
            character.audit(&session.tables)?
        };

        println!("{report}");
        if !report.is_valid() {
            bail!("'{}' does not match its declared progression", character.name());
        }
        Ok(())
    }
}
