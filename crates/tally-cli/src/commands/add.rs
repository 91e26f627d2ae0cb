//! Add command for recording a fact from raw text.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Args;

use crate::Config;

use super::open_lifecycle;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Raw fact: `[time info] activity[@category][, description]`.
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

impl AddArgs {
    /// The raw fact as typed, words joined by single spaces.
    pub fn raw_fact(&self) -> String {
        self.words.join(" ")
    }
}

pub fn run<W: Write>(
    writer: &mut W,
    args: &AddArgs,
    config: &Config,
    now: NaiveDateTime,
) -> Result<()> {
    let raw = args.raw_fact();
    let mut lifecycle = open_lifecycle(config)?;
    let fact = lifecycle
        .create_raw_at(&raw, now)
        .with_context(|| format!("failed to add {raw:?}"))?;

    let id = fact.pk.context("stored fact has no id")?;
    writeln!(writer, "Added fact {id}: {fact}")?;
    Ok(())
}
