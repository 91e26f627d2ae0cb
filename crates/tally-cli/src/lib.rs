//! Tally CLI library.
//!
//! This crate provides the command-line interface for recording and listing facts.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
