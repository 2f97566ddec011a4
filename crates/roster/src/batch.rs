//! Sequential batch leveling over a roster.

use character_core::{LevelUpSummary, ProgressionOracle, TierChoiceProvider, Track};

use crate::error::BatchError;
use crate::traits::CharacterRepository;

/// Outcome of one character in a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub name: String,
    pub result: Result<LevelUpSummary, BatchError>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Levels every named character's `track` to `target`, one after another.
///
/// Each character is loaded, leveled and saved on its own; a failure is
/// recorded in its outcome and leaves both that character and the rest of the
/// batch untouched.
pub fn level_up_all<R>(
    repository: &R,
    oracle: &dyn ProgressionOracle,
    names: &[String],
    track: Track,
    target: u32,
    chooser: &mut dyn TierChoiceProvider,
) -> Vec<BatchOutcome>
where
    R: CharacterRepository + ?Sized,
{
    let outcomes: Vec<BatchOutcome> = names
        .iter()
        .map(|name| BatchOutcome {
            name: name.clone(),
            result: level_up_one(repository, oracle, name, track, target, chooser),
        })
        .collect();

    let failed = outcomes.iter().filter(|outcome| !outcome.is_success()).count();
    tracing::info!(
        %track,
        target,
        total = outcomes.len(),
        failed,
        "batch level up finished"
    );
    outcomes
}

fn level_up_one<R>(
    repository: &R,
    oracle: &dyn ProgressionOracle,
    name: &str,
    track: Track,
    target: u32,
    chooser: &mut dyn TierChoiceProvider,
) -> Result<LevelUpSummary, BatchError>
where
    R: CharacterRepository + ?Sized,
{
    let mut character = repository
        .load(name)?
        .ok_or_else(|| BatchError::NotFound {
            name: name.to_string(),
        })?;
    match character.level_up(oracle, track, target, chooser) {
        Ok(summary) => {
            repository.save(&character)?;
            Ok(summary)
        }
        Err(err) => {
            tracing::warn!(character = name, error = %err, "batch level up skipped");
            Err(err.into())
        }
    }
}
