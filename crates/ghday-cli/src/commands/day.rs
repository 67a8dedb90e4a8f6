//! Day command: fetch and summarize one day in a single step.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use ghday_core::EventRecord;

use crate::Config;
use crate::commands::{fetch, summary, util::parse_date};

#[derive(Debug, Args)]
pub struct DayArgs {
    /// GitHub user whose events to summarize.
    pub user: String,

    /// Calendar date (UTC) in ISO 8601 form, e.g. 2025-04-22.
    #[arg(value_parser = parse_date)]
    pub date: NaiveDate,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,

    /// Fold each repository on its own thread.
    #[arg(long)]
    pub parallel: bool,
}

pub fn run(args: &DayArgs, config: &Config) -> Result<String> {
    let events = fetch::fetch_events(&args.user, args.date, config)?;

    let records = events
        .into_iter()
        .enumerate()
        .map(|(idx, value)| {
            EventRecord::from_value(value)
                .with_context(|| format!("invalid event #{} from the API", idx + 1))
        })
        .collect::<Result<Vec<_>>>()?;

    let parallel = args.parallel || config.parallel;
    let summary = summary::aggregate_records(records, &config.aggregate_options(), parallel)
        .with_context(|| {
            format!(
                "failed to summarize events for {} on {}",
                args.user, args.date
            )
        })?;
    summary::format_summary(&summary, config, args.json)
}
