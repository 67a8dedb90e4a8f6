//! Shared utilities for CLI commands.

use anyhow::Context;
use chrono::NaiveDate;

/// Parse a calendar date in ISO 8601 form (`2025-04-22`).
pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date: {s}. Use ISO 8601 (e.g., 2025-04-22)"))
}
