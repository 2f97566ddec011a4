//! Repository contract for saving and loading characters.

use character_core::Character;

use crate::error::Result;

/// Repository for character persistence, one row per character.
///
/// Names identify rows: `save` replaces the row carrying exactly the same
/// name, while `load` and `delete` match names case-insensitively.
pub trait CharacterRepository: Send + Sync {
    /// Insert or replace a character.
    fn save(&self, character: &Character) -> Result<()>;

    /// Load a character by name.
    fn load(&self, name: &str) -> Result<Option<Character>>;

    /// Remove every row matching `name`. Returns whether anything was removed.
    fn delete(&self, name: &str) -> Result<bool>;

    /// Names of all stored characters, in storage order.
    fn list_names(&self) -> Result<Vec<String>>;

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.load(name)?.is_some())
    }
}
