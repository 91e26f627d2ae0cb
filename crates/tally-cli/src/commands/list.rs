//! List and today commands for showing stored facts.
//!
//! `tally list` takes loose window bounds (`2015-12-10`, `09:00` or
//! `2015-12-10 09:00`); `tally today` shows the current logical day, which starts at
//! the configured `day_start`.

use std::io::Write;

use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use clap::Args;
use serde::Serialize;
use tally_core::{Fact, FactFilter, parse_time_value};

use crate::Config;

use super::{format_duration, open_database};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only facts starting at or after this date, time or `date time`.
    #[arg(long)]
    pub start: Option<String>,

    /// Only facts ending at or before this date, time or `date time`.
    #[arg(long)]
    pub end: Option<String>,

    /// Only facts whose activity or category contains this text.
    #[arg(long)]
    pub search: Option<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TodayArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

// ========== JSON Output ==========

#[derive(Debug, Serialize)]
pub struct JsonFacts {
    pub facts: Vec<JsonFact>,
    pub total_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct JsonFact {
    pub id: Option<i64>,
    pub start: String,
    pub end: String,
    pub activity: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: i64,
}

impl From<&Fact> for JsonFact {
    fn from(fact: &Fact) -> Self {
        Self {
            id: fact.pk.map(tally_core::FactId::get),
            start: fact.start.format(TIMESTAMP_FORMAT).to_string(),
            end: fact.end.format(TIMESTAMP_FORMAT).to_string(),
            activity: fact.activity.name.to_string(),
            category: fact.activity.category_name().map(ToString::to_string),
            description: fact.description.clone(),
            duration_minutes: fact.duration().num_minutes(),
        }
    }
}

fn total(facts: &[Fact]) -> Duration {
    facts
        .iter()
        .fold(Duration::zero(), |sum, fact| sum + fact.duration())
}

pub fn format_facts_json(facts: &[Fact]) -> Result<String> {
    let json = JsonFacts {
        facts: facts.iter().map(JsonFact::from).collect(),
        total_minutes: total(facts).num_minutes(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

// ========== Human-Readable Output ==========

pub fn write_facts<W: Write>(writer: &mut W, facts: &[Fact]) -> Result<()> {
    if facts.is_empty() {
        writeln!(writer, "No facts found.")?;
        return Ok(());
    }

    for fact in facts {
        let id = fact.pk.map(|pk| pk.to_string()).unwrap_or_default();
        write!(
            writer,
            "{:>4}  {} - {}  {:>7}  {}",
            id,
            fact.start.format("%Y-%m-%d %H:%M"),
            fact.end.format("%Y-%m-%d %H:%M"),
            format_duration(fact.duration()),
            fact.activity
        )?;
        if let Some(description) = &fact.description {
            write!(writer, ", {description}")?;
        }
        writeln!(writer)?;
    }
    writeln!(writer)?;
    writeln!(writer, "Total: {}", format_duration(total(facts)))?;
    Ok(())
}

fn emit<W: Write>(writer: &mut W, facts: &[Fact], json: bool) -> Result<()> {
    if json {
        writeln!(writer, "{}", format_facts_json(facts)?)?;
        Ok(())
    } else {
        write_facts(writer, facts)
    }
}

// ========== Public Interface ==========

/// Runs the list command.
pub fn run<W: Write>(
    writer: &mut W,
    args: &ListArgs,
    config: &Config,
    now: NaiveDateTime,
) -> Result<()> {
    let start = args.start.as_deref().map(parse_time_value).transpose()?;
    let end = args.end.as_deref().map(parse_time_value).transpose()?;
    let today = config.day_start.logical_date(now);
    let mut filter = FactFilter::from_bounds(start, end, config.day_start, today)?;
    if let Some(search) = &args.search {
        filter = filter.with_search(search.as_str());
    }
    tracing::debug!(?filter, "listing facts");

    let db = open_database(config)?;
    let facts = db.list_facts(&filter)?;
    emit(writer, &facts, args.json)
}

/// Runs the today command.
pub fn run_today<W: Write>(
    writer: &mut W,
    args: &TodayArgs,
    config: &Config,
    now: NaiveDateTime,
) -> Result<()> {
    let today = config.day_start.logical_date(now);
    let filter = FactFilter::day(today, config.day_start)?;

    let db = open_database(config)?;
    let facts = db.list_facts(&filter)?;
    if !args.json {
        writeln!(writer, "{today} (day starts {})", config.day_start)?;
        writeln!(writer)?;
    }
    emit(writer, &facts, args.json)
}
