//! File-based CharacterRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use character_core::{Character, CharacterRecord, ModifierCurve};

use crate::error::{RepositoryError, Result};
use crate::rows;
use crate::traits::CharacterRepository;

/// Roster stored as a single JSON-lines file.
///
/// # File Format
///
/// One JSON object per line, keyed by column name (see
/// `character_core::record`). Blank lines are ignored. Every write rewrites
/// the whole file through a temporary file and an atomic rename, so readers
/// never observe a half-written roster.
pub struct FileRoster {
    path: PathBuf,
    curve: ModifierCurve,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileRoster {
    /// Opens a roster at `path`, creating the parent directory. The file
    /// itself is created on first save.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            curve: ModifierCurve::STANDARD,
            lock: Mutex::new(()),
        })
    }

    pub fn with_curve(mut self, curve: ModifierCurve) -> Self {
        self.curve = curve;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored row, in file order.
    pub fn records(&self) -> Result<Vec<CharacterRecord>> {
        let _guard = self.lock.lock().map_err(|_| RepositoryError::LockPoisoned)?;
        self.read_rows()
    }

    fn read_rows(&self) -> Result<Vec<CharacterRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|e| RepositoryError::CorruptedData {
                    line: index + 1,
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    fn write_rows(&self, rows: &[CharacterRecord]) -> Result<()> {
        let mut content = String::new();
        for row in rows {
            let line =
                serde_json::to_string(row).map_err(|e| RepositoryError::Json(e.to_string()))?;
            content.push_str(&line);
            content.push('\n');
        }

        let temp_path = self.path.with_extension("jsonl.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl CharacterRepository for FileRoster {
    fn save(&self, character: &Character) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| RepositoryError::LockPoisoned)?;
        let mut table = self.read_rows()?;
        let replaced = rows::upsert(&mut table, character.to_record());
        self.write_rows(&table)?;

        tracing::info!(
            character = %character.name(),
            replaced,
            path = %self.path.display(),
            "character saved"
        );
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<Character>> {
        let _guard = self.lock.lock().map_err(|_| RepositoryError::LockPoisoned)?;
        let table = self.read_rows()?;
        let loaded = rows::find(&table, name)
            .map(|record| rows::restore(record, self.curve))
            .transpose()?;

        match &loaded {
            Some(character) => tracing::debug!(character = %character.name(), "character loaded"),
            None => tracing::debug!(name, "character not found"),
        }
        Ok(loaded)
    }

    fn delete(&self, name: &str) -> Result<bool> {
        let _guard = self.lock.lock().map_err(|_| RepositoryError::LockPoisoned)?;
        let mut table = self.read_rows()?;
        let removed = rows::remove(&mut table, name);
        if removed > 0 {
            self.write_rows(&table)?;
            tracing::info!(name, removed, "character deleted");
        }
        Ok(removed > 0)
    }

    fn list_names(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(rows::names(&self.read_rows()?))
    }
}
