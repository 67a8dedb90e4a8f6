//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{day::DayArgs, fetch::FetchArgs, summary::SummaryArgs};

/// Daily GitHub activity digest.
///
/// Collects a user's events for one calendar day and summarizes them per
/// repository, branch and pull request.
#[derive(Debug, Parser)]
#[command(name = "ghday", version, about, long_about = None)]
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
    /// Fetch a user's events for one day into an NDJSON file.
    Fetch(FetchArgs),

    /// Print the digest for an NDJSON events file.
    Summary(SummaryArgs),

    /// Fetch and summarize one day without writing a file.
    Day(DayArgs),
}
