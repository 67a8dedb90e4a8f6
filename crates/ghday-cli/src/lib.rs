//! Daily GitHub digest CLI library.
//!
//! This crate provides the CLI interface, configuration and NDJSON file
//! handling around the `ghday-core` engine.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
