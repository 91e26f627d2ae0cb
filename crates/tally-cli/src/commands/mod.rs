//! CLI subcommand implementations.

pub mod activities;
pub mod add;
pub mod categories;
pub mod edit;
pub mod list;
pub mod remove;

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDateTime, SubsecRound};
use tally_core::FactLifecycle;
use tally_db::Database;

use crate::Config;

/// The local wall clock, truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

fn open_database(config: &Config) -> Result<Database> {
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

/// Opens the database behind a lifecycle configured with the day start and overlap rule.
fn open_lifecycle(config: &Config) -> Result<FactLifecycle<Database>> {
    let db = open_database(config)?;
    Ok(FactLifecycle::new(db, config.day_start).with_overlap_rule(config.overlap_rule))
}

/// Formats a duration as `1h 5m` or `45m`.
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
