use anyhow::Result;
use clap::Parser;

use super::Session;

/// Show a stored character
#[derive(Parser, Debug)]
pub struct Show {
    /// Character name (case-insensitive)
    name: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    /// Meta, health, pool and per-source stat table
    Summary,
    /// The stored row as pretty-printed JSON
    Json,
}

impl Show {
    pub fn execute(self, session: &Session) -> Result<()> {
        let character = session.character(&self.name)?;
        match self.format {
            OutputFormat::Summary => println!("{character}"),
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&character.to_record())?)
            }
        }
        Ok(())
    }
}
