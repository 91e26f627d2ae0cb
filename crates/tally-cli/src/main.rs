use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tally_cli::commands::{activities, add, categories, edit, list, now, remove};
use tally_cli::{Cli, Commands, Config};

/// Load config, ensuring the database's parent directory exists.
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = load_config(cli.config.as_deref())?;
    let mut stdout = std::io::stdout().lock();
    match command {
        Commands::Add(args) => add::run(&mut stdout, args, &config, now())?,
        Commands::Edit(args) => edit::run(&mut stdout, args, &config, now())?,
        Commands::Remove(args) => remove::run(&mut stdout, args, &config)?,
        Commands::List(args) => list::run(&mut stdout, args, &config, now())?,
        Commands::Today(args) => list::run_today(&mut stdout, args, &config, now())?,
        Commands::Categories => categories::run(&mut stdout, &config)?,
        Commands::Activities(args) => activities::run(&mut stdout, args, &config)?,
    }
    stdout.flush()?;

    Ok(())
}
