//! Categories command for listing known categories.

use std::io::Write;

use anyhow::Result;

use crate::Config;

use super::open_database;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let categories = db.list_categories()?;

    if categories.is_empty() {
        writeln!(writer, "No categories.")?;
        return Ok(());
    }
    for category in categories {
        writeln!(writer, "{}", category.name)?;
    }
    Ok(())
}
