use anyhow::{Result, bail};
use clap::Parser;
use character_core::{LevelUpSummary, Track};
use console::style;
use roster::level_up_all;

use super::{Session, choices};

/// Level one or more characters up on a class or profession track
#[derive(Parser, Debug)]
pub struct LevelUp {
    /// Character names; each is leveled independently
    #[arg(required = true)]
    names: Vec<String>,

    /// Track to level
    #[arg(short, long, default_value = "class")]
    track: Track,

    /// Target level
    #[arg(long)]
    to: u32,

    /// Answer for a tier choice, in order (repeatable); asks on the terminal when omitted
    #[arg(long = "choose", value_name = "NAME")]
    choices: Vec<String>,
}

fn describe(summary: &LevelUpSummary) -> String {
    let mut parts = vec![format!("{} -> {}", summary.from_level, summary.to_level)];
    if summary.race_to != summary.race_from {
        parts.push(format!("race {} -> {}", summary.race_from, summary.race_to));
    }
    let gains: Vec<String> = summary
        .stats
        .non_zero()
        .map(|(stat, value)| format!("{stat} +{value}"))
        .collect();
    if !gains.is_empty() {
        parts.push(gains.join(", "));
    }
    parts.push(format!("{} free points", summary.free_points));
    for choice in &summary.choices {
        parts.push(format!("chose {} at {}", choice.name, choice.from_level));
    }
    parts.join("; ")
}

impl LevelUp {
    pub fn execute(self, session: &Session) -> Result<()> {
        let mut chooser = choices(&self.choices);
        let outcomes = level_up_all(
            &session.roster,
            &session.tables,
            &self.names,
            self.track,
            self.to,
            chooser.as_mut(),
        );

        let mut failed = 0;
        for outcome in &outcomes {
            match &outcome.result {
                Ok(summary) => println!(
                    "{} {}: {}",
                    style("✓").green().bold(),
                    style(&outcome.name).cyan(),
                    describe(summary)
                ),
                Err(err) => {
                    failed += 1;
                    println!(
                        "{} {}: {}",
                        style("✗").red().bold(),
                        style(&outcome.name).cyan(),
                        err
                    );
                }
            }
        }
        if failed > 0 {
            bail!("{failed} of {} level-ups failed", outcomes.len());
        }
        Ok(())
    }
}
