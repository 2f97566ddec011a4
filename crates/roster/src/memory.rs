//! In-memory CharacterRepository implementation.

use std::sync::RwLock;

use character_core::{Character, CharacterRecord, ModifierCurve};

use crate::error::{RepositoryError, Result};
use crate::rows;
use crate::traits::CharacterRepository;

/// In-memory roster holding flattened rows.
///
/// Characters pass through the same record layout as the file roster, so a
/// round trip here behaves exactly like one through disk.
pub struct InMemoryRoster {
    rows: RwLock<Vec<CharacterRecord>>,
    curve: ModifierCurve,
}

impl InMemoryRoster {
    pub fn new() -> Self {
        Self::with_curve(ModifierCurve::STANDARD)
    }

    pub fn with_curve(curve: ModifierCurve) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            curve,
        }
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self
            .rows
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemoryRoster {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterRepository for InMemoryRoster {
    fn save(&self, character: &Character) -> Result<()> {
        let mut table = self.rows.write().map_err(|_| RepositoryError::LockPoisoned)?;
        rows::upsert(&mut table, character.to_record());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<Character>> {
        let table = self.rows.read().map_err(|_| RepositoryError::LockPoisoned)?;
        rows::find(&table, name)
            .map(|record| rows::restore(record, self.curve))
            .transpose()
    }

    fn delete(&self, name: &str) -> Result<bool> {
        let mut table = self.rows.write().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(rows::remove(&mut table, name) > 0)
    }

    fn list_names(&self) -> Result<Vec<String>> {
        let table = self.rows.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(rows::names(&table))
    }
}
