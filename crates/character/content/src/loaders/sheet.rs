//! Character sheet loader.
//!
//! A sheet is a hand-maintained snapshot of a character: starting stats, the
//! stats it shows now, and the progression it claims. It feeds the
//! reverse-engineering validator.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, bail};
use character_core::{
    DeclaredProgression, ProgressionError, ProgressionHistory, ProgressionOracle,
    ReverseEngineeringInput, ReverseEngineeringValidator, Stat, StatBlock, TierThresholds,
    TrackProgress, ValidationReport,
};
use serde::Deserialize;

use crate::loaders::{LoadResult, read_file, stat_block};

/// RON layout of a sheet.
///
/// ```ron
/// (
///     name: "Ivy",
///     class: (level: 2, history: [("heavy warrior", 1)]),
///     race: [("human", 0)],
///     base: { "strength": 5, ... },
///     current: { "strength": 10, ... },
///     free_points: 1,
/// )
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SheetFile {
    name: String,
    #[serde(default)]
    tier_thresholds: TierThresholds,
    #[serde(default)]
    class: TrackSheet,
    #[serde(default)]
    profession: TrackSheet,
    #[serde(default)]
    race: Vec<(String, u32)>,
    base: BTreeMap<String, i32>,
    current: BTreeMap<String, i32>,
    #[serde(default)]
    adjustments: BTreeMap<String, i32>,
    #[serde(default)]
    free_points: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TrackSheet {
    level: u32,
    #[serde(default)]
    history: Vec<(String, u32)>,
}

fn history(entries: &[(String, u32)]) -> LoadResult<ProgressionHistory> {
    let mut history = ProgressionHistory::new();
    let mut previous: Option<u32> = None;
    for (name, from_level) in entries {
        if previous.is_some_and(|level| level >= *from_level) {
            bail!("history entry '{name}' at level {from_level} is out of order");
        }
        history.supersede(name, *from_level);
        previous = Some(*from_level);
    }
    Ok(history)
}

fn complete_block(label: &str, values: &BTreeMap<String, i32>) -> LoadResult<StatBlock> {
    let block = stat_block(values).with_context(|| format!("sheet {label}"))?;
    for stat in Stat::ALL {
        if !values.keys().any(|name| Stat::lookup(name).is_ok_and(|s| s == stat)) {
            bail!("sheet {label} is missing {stat}");
        }
    }
    Ok(block)
}

/// A named validator input read from a sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterSheet {
    pub name: String,
    pub input: ReverseEngineeringInput,
}

impl CharacterSheet {
    pub fn validate(
        &self,
        oracle: &dyn ProgressionOracle,
    ) -> Result<ValidationReport, ProgressionError> {
        ReverseEngineeringValidator::new(oracle).validate(&self.input)
    }
}

/// Loader for character sheets from RON files.
pub struct SheetLoader;

impl SheetLoader {
    pub fn load(path: &Path) -> LoadResult<CharacterSheet> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("Invalid sheet at {}", path.display()))
    }

    /// Parse a sheet; `base` and `current` must list every stat.
    pub fn parse(content: &str) -> LoadResult<CharacterSheet> {
        let sheet: SheetFile = ron::from_str(content).context("Failed to parse sheet RON")?;

        let class = TrackProgress::new(
            sheet.class.level,
            history(&sheet.class.history).context("class history")?,
        );
        let profession = TrackProgress::new(
            sheet.profession.level,
            history(&sheet.profession.history).context("profession history")?,
        );
        let race = history(&sheet.race).context("race history")?;

        let input = ReverseEngineeringInput {
            base: complete_block("base", &sheet.base)?,
            current: complete_block("current", &sheet.current)?,
            adjustments: stat_block(&sheet.adjustments).context("sheet adjustments")?,
            declaration: DeclaredProgression::new(sheet.tier_thresholds, class, profession, race),
            declared_pool: sheet.free_points,
        };
        tracing::debug!(sheet = %sheet.name, "character sheet loaded");
        Ok(CharacterSheet {
            name: sheet.name,
            input,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TablesLoader;
    use character_core::ValidationIssue;

    const SHEET: &str = r#"
        (
            name: "Ivy",
            class: (level: 2, history: [("Heavy Warrior", 1)]),
            race: [("human", 0)],
            base: {
                "vitality": 5, "endurance": 5, "strength": 5, "dexterity": 5, "toughness": 5,
                "intelligence": 5, "willpower": 5, "wisdom": 5, "perception": 5,
            },
            current: {
                "vitality": 10, "endurance": 8, "strength": 10, "dexterity": 9, "toughness": 8,
                "intelligence": 6, "willpower": 6, "wisdom": 6, "perception": 6,
            },
            free_points: 1,
        )
    "#;

    #[test]
    fn sheet_feeds_the_validator() {
        let tables = TablesLoader::bundled().unwrap();
        let sheet = SheetLoader::parse(SHEET).unwrap();
        assert_eq!(sheet.name, "Ivy");
        assert_eq!(sheet.input.declaration.race_level, 1);
        assert_eq!(
            sheet.input.declaration.class.history().current(),
            Some("heavy warrior")
        );

        let report = sheet.validate(&tables).unwrap();
        // Two warrior levels grant 4, race level 1 grants 1; three went into dexterity.
        assert!(report.is_valid(), "{report}");
        assert_eq!(report.balance.granted, 5);
        assert_eq!(report.balance.spent, 3);
        assert_eq!(report.corrected_pool(), Some(2));
    }

    #[test]
    fn stat_below_the_rules_is_reported() {
        let tables = TablesLoader::bundled().unwrap();
        let tampered = SHEET.replace("\"strength\": 10", "\"strength\": 7");
        let report = SheetLoader::parse(&tampered)
            .unwrap()
            .validate(&tables)
            .unwrap();
        assert!(report.issues.iter().any(|issue| matches!(
            issue,
            ValidationIssue::BelowRuleFloor {
                stat: Stat::Strength,
                ..
            }
        )));
    }

    #[test]
    fn incomplete_or_disordered_sheets_fail() {
        let missing = SHEET.replace("\"perception\": 6,", "");
        let err = SheetLoader::parse(&missing).unwrap_err();
        assert!(format!("{err:#}").contains("missing perception"), "{err:#}");

        let disordered = SHEET.replace(
            "[(\"Heavy Warrior\", 1)]",
            "[(\"heavy warrior\", 5), (\"mage\", 2)]",
        );
        assert!(SheetLoader::parse(&disordered).is_err());
    }
}
