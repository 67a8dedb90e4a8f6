//! CLI subcommand implementations.

pub mod day;
pub mod fetch;
pub mod summary;
pub mod util;
