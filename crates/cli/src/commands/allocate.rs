use anyhow::{Result, bail};
use clap::Parser;
use character_core::Stat;
use console::style;
use rand::SeedableRng;
use rand::rngs::StdRng;
use roster::CharacterRepository;

use super::Session;

/// Spend free points
#[derive(Parser, Debug)]
pub struct Allocate {
    /// Character name
    name: String,

    /// Stat to raise
    #[arg(required_unless_present = "random")]
    stat: Option<Stat>,

    /// Points to spend
    #[arg(required_unless_present = "random")]
    amount: Option<i32>,

    /// Spend the whole pool on random stats
    #[arg(long, conflicts_with_all = ["stat", "amount"])]
    random: bool,

    /// Seed for --random
    #[arg(long, requires = "random")]
    seed: Option<u64>,
}

impl Allocate {
    pub fn execute(self, session: &Session) -> Result<()> {
        let mut character = session.character(&self.name)?;

        if self.random {
            let mut rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let tally = character.allocate_random(&mut rng)?;
            session.roster.save(&character)?;
            for (stat, points) in tally.non_zero() {
                println!("{stat} +{points}");
            }
            return Ok(());
        }

        let (Some(stat), Some(amount)) = (self.stat, self.amount) else {
            bail!("a stat and an amount are required without --random");
        };
        let remaining = character.allocate(stat, amount)?;
        session.roster.save(&character)?;
        println!(
            "{} {stat} is now {} ({} points left)",
            style("✓").green().bold(),
            character.stat(stat),
            remaining
        );
        Ok(())
    }
}
