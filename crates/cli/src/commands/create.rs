use anyhow::{Context, Result, bail};
use clap::Parser;
use character_core::{Character, Stat, StatBlock};
use console::style;
use roster::CharacterRepository;

use super::Session;

/// Create a character and store it in the roster
#[derive(Parser, Debug)]
pub struct Create {
    /// Character name
    name: String,

    /// Starting class
    #[arg(long)]
    class: Option<String>,

    /// Class level to replay up to
    #[arg(long, default_value_t = 1)]
    class_level: u32,

    /// Starting profession
    #[arg(long)]
    profession: Option<String>,

    /// Profession level to replay up to
    #[arg(long, default_value_t = 1)]
    profession_level: u32,

    /// Race
    #[arg(long)]
    race: Option<String>,

    /// Base stat override, e.g. `--stat strength=7` (repeatable)
    #[arg(long = "stat", value_name = "STAT=VALUE", value_parser = parse_stat_value)]
    stats: Vec<(Stat, i32)>,

    /// Replace an existing character with the same name
    #[arg(long)]
    force: bool,
}

fn parse_stat_value(raw: &str) -> Result<(Stat, i32)> {
    let (stat, value) = raw
        .split_once('=')
        .context("expected STAT=VALUE")?;
    let stat = Stat::lookup(stat)?;
    let value = value.trim().parse().context("stat value must be an integer")?;
    Ok((stat, value))
}

impl Create {
    pub fn execute(self, session: &Session) -> Result<()> {
        if !self.force && session.roster.exists(&self.name)? {
            bail!("'{}' already exists; use --force to replace it", self.name);
        }

        let mut base = StatBlock::splat(session.engine.base_stat);
        for (stat, value) in &self.stats {
            base[*stat] = *value;
        }

        let mut builder = Character::builder(&self.name).config(&session.engine).base(base);
        if let Some(class) = &self.class {
            builder = builder.class(class, self.class_level);
        }
        if let Some(profession) = &self.profession {
            builder = builder.profession(profession, self.profession_level);
        }
        if let Some(race) = &self.race {
            builder = builder.race(race);
        }

        let character = builder.build(&session.tables)?;
        session.roster.save(&character)?;
        println!("{} Created {}", style("✓").green().bold(), style(&self.name).cyan());
        println!("{character}");
        Ok(())
    }
}
