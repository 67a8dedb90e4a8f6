//! Single-pass fold of classified events into the digest accumulators.
//!
//! Three accumulators are built side by side, all keyed by project:
//! - digest counters (metric name to count, in first-increment order)
//! - commit rollup (branch to commits, each push closed by a compare link)
//! - interaction log (PR threads, issue activity, everything else)

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::classify::{Action, DataError, Push, classify};
use crate::event::EventRecord;
use crate::types::ProjectKey;

/// Host used for compare links when none is configured.
pub const DEFAULT_WEB_HOST: &str = "github.com";

/// What to do with a recognized event that is missing a required field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Stop the run and return the error.
    #[default]
    Abort,
    /// Log a warning, count the record as skipped, and continue.
    Skip,
}

/// Options for an aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Web host that compare links point at.
    pub web_host: String,
    pub on_malformed: MalformedPolicy,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            web_host: DEFAULT_WEB_HOST.to_string(),
            on_malformed: MalformedPolicy::default(),
        }
    }
}

/// Digest counter names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metric {
    PushCommits,
    PullRequest(String),
    Reviews,
    ReviewComments,
    Issue(String),
    IssueComments,
    BranchesCreated,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PushCommits => write!(f, "push_commits"),
            Self::PullRequest(action) => write!(f, "pr_{action}"),
            Self::Reviews => write!(f, "reviews"),
            Self::ReviewComments => write!(f, "review_comments"),
            Self::Issue(action) => write!(f, "issue_{action}"),
            Self::IssueComments => write!(f, "issue_comments"),
            Self::BranchesCreated => write!(f, "branches_created"),
        }
    }
}

/// One line of the commit rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RollupEntry {
    Commit { sha: String, message: String },
    /// Closes a push with a link comparing its before and head revisions.
    Compare { url: String },
}

/// One PR or issue interaction, rendered to text by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interaction {
    PullRequest { number: u64, action: String },
    Review { number: u64, state: String },
    ReviewComment { number: u64, body: String },
    Issue { number: u64, action: String, title: String },
    IssueComment { number: u64, body: String },
    BranchCreated { ref_name: String },
}

/// All activity on one pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestThread {
    /// First title seen for this number; later titles never replace it.
    pub title: String,
    pub entries: Vec<Interaction>,
}

/// Interaction log for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectInteractions {
    /// Threads in the order their numbers were first seen.
    pub pull_requests: IndexMap<u64, PullRequestThread>,
    pub issues: Vec<Interaction>,
    pub other: Vec<Interaction>,
}

pub type Digest = BTreeMap<ProjectKey, IndexMap<String, u64>>;
pub type CommitRollup = BTreeMap<ProjectKey, IndexMap<String, Vec<RollupEntry>>>;
pub type InteractionLog = BTreeMap<ProjectKey, ProjectInteractions>;

/// The accumulators produced by one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub digest: Digest,
    pub commits: CommitRollup,
    pub interactions: InteractionLog,
    /// Malformed records dropped under [`MalformedPolicy::Skip`].
    pub skipped: usize,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.digest.is_empty() && self.commits.is_empty() && self.interactions.is_empty()
    }

    /// Folds in a summary built from a disjoint set of projects.
    fn merge(&mut self, other: Self) {
        self.digest.extend(other.digest);
        self.commits.extend(other.commits);
        self.interactions.extend(other.interactions);
        self.skipped += other.skipped;
    }
}

/// Stateful fold over an ordered event sequence.
#[derive(Debug)]
pub struct Aggregator {
    options: AggregateOptions,
    summary: Summary,
}

impl Aggregator {
    pub fn new(options: AggregateOptions) -> Self {
        Self {
            options,
            summary: Summary::default(),
        }
    }

    /// Classifies one event and records it against its project.
    pub fn apply(&mut self, record: &EventRecord) -> Result<(), DataError> {
        let action = match classify(record) {
            Ok(action) => action,
            Err(err) => match self.options.on_malformed {
                MalformedPolicy::Abort => return Err(err),
                MalformedPolicy::Skip => {
                    tracing::warn!(%err, "skipping malformed event");
                    self.summary.skipped += 1;
                    return Ok(());
                }
            },
        };

        let project = &record.project_key;
        match action {
            Action::Push(push) => self.record_push(project, &push),
            Action::PullRequest {
                action,
                number,
                title,
            } => {
                self.bump(project, Metric::PullRequest(action.clone()), 1);
                let interaction = Interaction::PullRequest {
                    number,
                    action,
                };
                self.thread(project, number, title).entries.push(interaction);
            }
            Action::Review {
                number,
                title,
                state,
            } => {
                self.bump(project, Metric::Reviews, 1);
                self.thread(project, number, title)
                    .entries
                    .push(Interaction::Review { number, state });
            }
            Action::ReviewComment {
                number,
                title,
                body,
            } => {
                self.bump(project, Metric::ReviewComments, 1);
                self.thread(project, number, title)
                    .entries
                    .push(Interaction::ReviewComment { number, body });
            }
            Action::Issue {
                action,
                number,
                title,
            } => {
                self.bump(project, Metric::Issue(action.clone()), 1);
                self.project_log(project).issues.push(Interaction::Issue {
                    number,
                    action,
                    title,
                });
            }
            Action::IssueComment { number, body } => {
                self.bump(project, Metric::IssueComments, 1);
                self.project_log(project)
                    .issues
                    .push(Interaction::IssueComment { number, body });
            }
            Action::BranchCreated { ref_name } => {
                self.bump(project, Metric::BranchesCreated, 1);
                self.project_log(project)
                    .other
                    .push(Interaction::BranchCreated { ref_name });
            }
            Action::Ignored => {
                tracing::trace!(kind = %record.kind, %project, "ignoring event");
            }
        }

        Ok(())
    }

    /// Ends the run and hands over the accumulators.
    pub fn finish(self) -> Summary {
        self.summary
    }

    fn record_push(&mut self, project: &ProjectKey, push: &Push) {
        self.bump(project, Metric::PushCommits, push.size);

        let url = compare_url(&self.options.web_host, project, &push.before, &push.head);
        let entries = self
            .summary
            .commits
            .entry(project.clone())
            .or_default()
            .entry(branch_name(&push.git_ref).to_string())
            .or_default();
        entries.extend(push.commits.iter().map(|commit| RollupEntry::Commit {
            sha: short_sha(&commit.sha).to_string(),
            message: first_line(&commit.message).to_string(),
        }));
        entries.push(RollupEntry::Compare { url });
    }

    fn bump(&mut self, project: &ProjectKey, metric: Metric, by: u64) {
        *self
            .summary
            .digest
            .entry(project.clone())
            .or_default()
            .entry(metric.to_string())
            .or_insert(0) += by;
    }

    fn project_log(&mut self, project: &ProjectKey) -> &mut ProjectInteractions {
        self.summary
            .interactions
            .entry(project.clone())
            .or_default()
    }

    fn thread(
        &mut self,
        project: &ProjectKey,
        number: u64,
        title: String,
    ) -> &mut PullRequestThread {
        self.project_log(project)
            .pull_requests
            .entry(number)
            .or_insert_with(|| PullRequestThread {
                title,
                entries: Vec::new(),
            })
    }
}

/// Aggregates an ordered event sequence in a single pass.
pub fn aggregate<I>(events: I, options: &AggregateOptions) -> Result<Summary, DataError>
where
    I: IntoIterator<Item = EventRecord>,
{
    let mut aggregator = Aggregator::new(options.clone());
    for event in events {
        aggregator.apply(&event)?;
    }
    let summary = aggregator.finish();
    tracing::debug!(
        projects = summary.digest.len(),
        skipped = summary.skipped,
        "aggregation finished"
    );
    Ok(summary)
}

/// Aggregates with one fold per project on the rayon pool.
///
/// Arrival order is kept within each project, so the result equals
/// [`aggregate`] on the same input. When several projects hold malformed
/// records under [`MalformedPolicy::Abort`], the error for the
/// lexicographically first such project is returned.
pub fn aggregate_parallel<I>(events: I, options: &AggregateOptions) -> Result<Summary, DataError>
where
    I: IntoIterator<Item = EventRecord>,
{
    let mut partitions: BTreeMap<ProjectKey, Vec<EventRecord>> = BTreeMap::new();
    for event in events {
        partitions
            .entry(event.project_key.clone())
            .or_default()
            .push(event);
    }

    let results: Vec<Result<Summary, DataError>> = partitions
        .into_values()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|partition| aggregate(partition, options))
        .collect();

    let mut summary = Summary::default();
    for result in results {
        summary.merge(result?);
    }
    Ok(summary)
}

/// Final path segment of a ref: `refs/heads/foo/bar` becomes `bar`.
pub fn branch_name(git_ref: &str) -> &str {
    git_ref.rsplit('/').next().unwrap_or(git_ref)
}

/// First seven characters of a commit id.
pub fn short_sha(sha: &str) -> &str {
    sha.char_indices().nth(7).map_or(sha, |(idx, _)| &sha[..idx])
}

/// Whether `c` ends a line: `\n`, `\r`, the ASCII vertical tab, form feed and
/// file/group/record separators, NEL, and the Unicode line and paragraph
/// separators.
pub const fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\x0b'
            | '\x0c'
            | '\x1c'
            | '\x1d'
            | '\x1e'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

/// First line of a possibly multi-line text, empty for empty input.
pub fn first_line(text: &str) -> &str {
    text.split(is_line_break).next().unwrap_or("")
}

/// Link comparing two revisions of a project.
pub fn compare_url(web_host: &str, project: &ProjectKey, before: &str, head: &str) -> String {
    format!("https://{web_host}/{project}/compare/{before}...{head}")
}
