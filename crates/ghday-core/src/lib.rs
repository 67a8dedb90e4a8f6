//! Core domain logic for the daily GitHub digest.
//!
//! This crate contains the event aggregation and reporting engine:
//! - Event records: decoding platform events into typed records
//! - Classification: mapping each event to the action it represents
//! - Aggregation: folding actions into digest, commit rollup and interaction log
//! - Rendering: turning the accumulators into the three report sections

pub mod aggregate;
pub mod classify;
pub mod event;
pub mod event_kind;
pub mod render;
pub mod types;

pub use aggregate::{
    AggregateOptions, Aggregator, CommitRollup, Digest, Interaction, InteractionLog,
    MalformedPolicy, ProjectInteractions, PullRequestThread, RollupEntry, Summary, aggregate,
    aggregate_parallel,
};
pub use classify::{Action, DataError, classify};
pub use event::{DecodeError, EventRecord};
pub use event_kind::EventKind;
pub use render::{RenderOptions, render_json, render_text};
pub use types::{ProjectKey, ValidationError};
