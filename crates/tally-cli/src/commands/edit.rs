//! Edit command for replacing a stored fact.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Args;
use tally_core::{FactId, RawFact};

use crate::Config;

use super::open_lifecycle;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// ID of the fact to replace.
    pub id: i64,

    /// New raw fact: `[time info] activity[@category][, description]`.
    #[arg(
        required = true,
        num_args = 1..,
        allow_hyphen_values = true,
        allow_negative_numbers = true,
        trailing_var_arg = true,
        value_name = "RAW_FACT"
    )]
    pub words: Vec<String>,
}

impl EditArgs {
    pub fn raw_fact(&self) -> String {
        self.words.join(" ")
    }
}

/// Replaces fact `args.id` with the parsed raw fact, keeping its id.
///
/// The new fact is checked for overlaps against every other stored fact.
pub fn run<W: Write>(
    writer: &mut W,
    args: &EditArgs,
    config: &Config,
    now: NaiveDateTime,
) -> Result<()> {
    let id = FactId::new(args.id);
    let raw = args.raw_fact();
    let mut lifecycle = open_lifecycle(config)?;

    let previous = lifecycle.store().get_fact(id)?;
    let mut fact = RawFact::parse(&raw)?.resolve(lifecycle.boundary(), now)?;
    fact.pk = Some(id);
    let fact = lifecycle
        .update(fact)
        .with_context(|| format!("failed to update fact {id}"))?;

    tracing::debug!(fact_id = %id, previous = %previous, "replaced fact");
    writeln!(writer, "Updated fact {id}: {fact}")?;
    Ok(())
}
