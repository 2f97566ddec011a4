use std::path::PathBuf;

use anyhow::{Result, bail};
use character_content::SheetLoader;
use clap::Parser;

use super::Session;

/// Reverse-engineer a RON character sheet
#[derive(Parser, Debug)]
pub struct ImportSheet {
    /// Sheet file, or a sheet name under the content directory's `sheets/`
    #[arg(value_name = "SHEET")]
    sheet: String,
}

impl ImportSheet {
    pub fn execute(self, session: &Session) -> Result<()> {
        let path = PathBuf::from(&self.sheet);
        let sheet = match &session.content {
            Some(factory) if !path.exists() => factory.load_sheet(&self.sheet)?,
            _ => SheetLoader::load(&path)?,
        };

        let report = sheet.validate(&session.tables)?;
        println!("Sheet: {}", sheet.name);
        println!("{report}");
        if !report.is_valid() {
            bail!("sheet '{}' is not explained by its declared progression", sheet.name);
        }
        Ok(())
    }
}
