//! Summary command for rendering the digest of an NDJSON events file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use ghday_core::{
    AggregateOptions, Aggregator, DataError, EventRecord, Summary, aggregate, aggregate_parallel,
    render_json, render_text,
};

use crate::Config;

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// NDJSON file with one event per line, as written by `ghday fetch`.
    pub path: PathBuf,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,

    /// Fold each repository on its own thread.
    #[arg(long)]
    pub parallel: bool,
}

pub fn run(args: &SummaryArgs, config: &Config) -> Result<String> {
    let file = File::open(&args.path)
        .with_context(|| format!("failed to open {}", args.path.display()))?;
    let reader = BufReader::new(file);
    let options = config.aggregate_options();

    let summary = if args.parallel || config.parallel {
        let records = read_records(reader)
            .with_context(|| format!("failed to read {}", args.path.display()))?;
        aggregate_records(records, &options, true)
            .with_context(|| format!("failed to summarize {}", args.path.display()))?
    } else {
        summarize_lines(reader, &options)
            .with_context(|| format!("failed to summarize {}", args.path.display()))?
    };
    format_summary(&summary, config, args.json)
}

/// Aggregates newline-delimited events, skipping blank lines.
pub fn summarize_lines<R: BufRead>(reader: R, options: &AggregateOptions) -> Result<Summary> {
    let mut aggregator = Aggregator::new(options.clone());
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record = EventRecord::from_json_line(trimmed)
            .with_context(|| format!("invalid event on line {}", idx + 1))?;
        aggregator
            .apply(&record)
            .with_context(|| format!("malformed event on line {}", idx + 1))?;
    }
    Ok(aggregator.finish())
}

/// Decodes every non-blank line up front, for folds that need the whole day.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<EventRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record = EventRecord::from_json_line(trimmed)
            .with_context(|| format!("invalid event on line {}", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Folds decoded records, one project per rayon task when `parallel` is set.
pub fn aggregate_records(
    records: Vec<EventRecord>,
    options: &AggregateOptions,
    parallel: bool,
) -> Result<Summary, DataError> {
    if parallel {
        tracing::debug!(records = records.len(), "aggregating projects in parallel");
        aggregate_parallel(records, options)
    } else {
        aggregate(records, options)
    }
}

/// Renders the summary as the text report or as JSON.
pub fn format_summary(summary: &Summary, config: &Config, json: bool) -> Result<String> {
    if summary.skipped > 0 {
        tracing::info!(skipped = summary.skipped, "malformed events were skipped");
    }

    if json {
        let mut output = render_json(summary).context("failed to encode summary")?;
        output.push('\n');
        Ok(output)
    } else {
        Ok(render_text(summary, &config.render_options()))
    }
}
