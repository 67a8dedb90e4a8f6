//! Fetch command for saving one day of events as NDJSON.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use ghday_github::Client;
use serde_json::Value;

use crate::Config;
use crate::commands::util::parse_date;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// GitHub user whose events to fetch.
    pub user: String,

    /// Calendar date (UTC) in ISO 8601 form, e.g. 2025-04-22.
    #[arg(value_parser = parse_date)]
    pub date: NaiveDate,

    /// Output file (defaults to `<output_dir>/<user>-<date>.ndjson`).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct FetchReport {
    pub path: PathBuf,
    pub events: usize,
}

pub fn run(args: &FetchArgs, config: &Config) -> Result<FetchReport> {
    let events = fetch_events(&args.user, args.date, config)?;

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&config.output_dir, &args.user, args.date));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_events(&mut writer, &events)?;
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(FetchReport {
        path,
        events: events.len(),
    })
}

/// Fetches the events `user` produced on `date`, oldest first.
pub fn fetch_events(user: &str, date: NaiveDate, config: &Config) -> Result<Vec<Value>> {
    let client = Client::new(config.client_options()).context("failed to create GitHub client")?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let events = runtime
        .block_on(client.fetch_day(user, date))
        .with_context(|| format!("failed to fetch events for {user} on {date}"))?;
    tracing::debug!(user, %date, count = events.len(), "fetched events");
    Ok(events)
}

/// `<dir>/<user>-<date>.ndjson`
pub fn default_output_path(dir: &Path, user: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("{user}-{}.ndjson", date.format("%Y-%m-%d")))
}

/// Writes one JSON object per line.
pub fn write_events<W: Write>(writer: &mut W, events: &[Value]) -> Result<()> {
    for event in events {
        serde_json::to_writer(&mut *writer, event).context("failed to encode event")?;
        writer.write_all(b"\n").context("failed to write event")?;
    }
    Ok(())
}
