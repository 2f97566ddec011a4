//! Row bookkeeping shared by every repository.

use character_core::{Character, CharacterRecord, ModifierCurve};

use crate::error::{RepositoryError, Result};

fn matches(record: &CharacterRecord, name: &str) -> bool {
    record
        .name()
        .is_some_and(|stored| stored.trim().eq_ignore_ascii_case(name.trim()))
}

/// Replaces the row with exactly the same name, or appends.
pub(crate) fn upsert(rows: &mut Vec<CharacterRecord>, record: CharacterRecord) -> bool {
    match rows.iter_mut().find(|row| row.name() == record.name()) {
        Some(row) => {
            *row = record;
            true
        }
        None => {
            rows.push(record);
            false
        }
    }
}

pub(crate) fn find<'a>(rows: &'a [CharacterRecord], name: &str) -> Option<&'a CharacterRecord> {
    rows.iter().find(|row| matches(row, name))
}

pub(crate) fn remove(rows: &mut Vec<CharacterRecord>, name: &str) -> usize {
    let before = rows.len();
    rows.retain(|row| !matches(row, name));
    before - rows.len()
}

pub(crate) fn names(rows: &[CharacterRecord]) -> Vec<String> {
    rows.iter()
        .filter_map(CharacterRecord::name)
        .map(String::from)
        .collect()
}

pub(crate) fn restore(record: &CharacterRecord, curve: ModifierCurve) -> Result<Character> {
    Character::from_record(record, curve).map_err(|cause| RepositoryError::Record {
        name: record.name().unwrap_or_default().to_string(),
        cause,
    })
}
