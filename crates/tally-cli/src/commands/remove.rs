//! Remove command for deleting a stored fact.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use tally_core::FactId;

use crate::Config;

use super::open_lifecycle;

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// ID of the fact to delete.
    pub id: i64,
}

pub fn run<W: Write>(writer: &mut W, args: &RemoveArgs, config: &Config) -> Result<()> {
    let id = FactId::new(args.id);
    let mut lifecycle = open_lifecycle(config)?;
    lifecycle
        .remove(id)
        .with_context(|| format!("failed to remove fact {id}"))?;
    writeln!(writer, "Removed fact {id}")?;
    Ok(())
}
