//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::activities::ActivitiesArgs;
use crate::commands::add::AddArgs;
use crate::commands::edit::EditArgs;
use crate::commands::list::{ListArgs, TodayArgs};
use crate::commands::remove::RemoveArgs;

/// Plain-text time tracker.
///
/// Records facts such as `09:00-10:15 coding@work, code review` and keeps them
/// free of overlaps.
#[derive(Debug, Parser)]
#[command(name = "tally", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a fact, e.g. `tally add 09:00-10:15 coding@work, code review`.
    Add(AddArgs),

    /// Replace a stored fact with a new raw fact.
    Edit(EditArgs),

    /// Delete a stored fact.
    Remove(RemoveArgs),

    /// List facts in a time window.
    List(ListArgs),

    /// List the facts of the current logical day.
    Today(TodayArgs),

    /// List known categories.
    Categories,

    /// List known activities.
    Activities(ActivitiesArgs),
}
