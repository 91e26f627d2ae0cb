//! Activities command for listing activities, optionally narrowed down.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use tally_core::CategoryName;

use crate::Config;

use super::open_database;

#[derive(Debug, Args)]
pub struct ActivitiesArgs {
    /// Only activities in this category.
    #[arg(long)]
    pub category: Option<String>,

    /// Only activities whose name contains this text.
    #[arg(long)]
    pub search: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &ActivitiesArgs, config: &Config) -> Result<()> {
    let category = args
        .category
        .as_deref()
        .map(CategoryName::new)
        .transpose()?;
    let search = args.search.as_deref().filter(|term| !term.trim().is_empty());

    let db = open_database(config)?;
    let activities = db.list_activities(category.as_ref(), search)?;

    if activities.is_empty() {
        writeln!(writer, "No activities.")?;
        return Ok(());
    }
    for activity in activities {
        writeln!(writer, "{activity}")?;
    }
    Ok(())
}
