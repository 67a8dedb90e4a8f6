//! Text rendering of the digest accumulators.
//!
//! Every function here is pure: accumulators in, lines out. Printing is up to
//! the caller.
//!
//! Every section is its header, a blank line, the body, and a closing blank
//! line. In the commit and interaction sections each project block also ends
//! with its own blank line.

use crate::aggregate::{
    CommitRollup, Digest, Interaction, InteractionLog, RollupEntry, Summary, first_line,
};

/// Comment snippets are cut to this many characters unless configured.
pub const DEFAULT_SNIPPET_CHARS: usize = 80;

/// Presentation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Maximum characters kept from the first line of a comment body.
    pub snippet_chars: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }
}

/// Per-project counter lines, projects sorted.
pub fn render_digest(digest: &Digest) -> Vec<String> {
    let mut lines = vec!["# Per-repo digest".to_string(), String::new()];

    for (project, metrics) in digest {
        let parts = metrics
            .iter()
            .map(|(metric, count)| format!("{count} × {}", metric.replace('_', " ")))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("* **{project}** – {parts}"));
    }

    lines.push(String::new());
    lines
}

/// Commits grouped by project and branch, each push closed by its compare link.
pub fn render_commits(commits: &CommitRollup) -> Vec<String> {
    let mut lines = vec!["# Commit roll-up".to_string(), String::new()];

    for (project, branches) in commits {
        lines.push(format!("## {project}"));
        for (branch, entries) in branches {
            lines.push(format!("### {branch}"));
            for entry in entries {
                lines.push(match entry {
                    RollupEntry::Commit { sha, message } => format!("- {sha}  {message}"),
                    RollupEntry::Compare { url } => format!("↪\u{fe0e} compare diff: {url}"),
                });
            }
        }
        lines.push(String::new());
    }

    lines.push(String::new());
    lines
}

/// PR threads, then issue activity, then other activity, per project.
pub fn render_interactions(interactions: &InteractionLog, options: &RenderOptions) -> Vec<String> {
    let mut lines = vec![
        "# PR / Issue interaction summary".to_string(),
        String::new(),
    ];

    for (project, log) in interactions {
        lines.push(format!("## {project}"));

        for (number, thread) in &log.pull_requests {
            lines.push(format!("- PR #{number}: {}", thread.title));
            for entry in &thread.entries {
                lines.push(format!("  - {}", interaction_line(entry, options)));
            }
        }

        for entry in log.issues.iter().chain(&log.other) {
            lines.push(format!("- {}", interaction_line(entry, options)));
        }
        lines.push(String::new());
    }

    lines.push(String::new());
    lines
}

/// The human-readable line for one interaction.
pub fn interaction_line(interaction: &Interaction, options: &RenderOptions) -> String {
    match interaction {
        Interaction::PullRequest { number, action } => {
            format!("PR #{number} {}", action.to_uppercase())
        }
        Interaction::Review { number, state } => format!("Reviewed PR #{number} → {state}"),
        Interaction::ReviewComment { number, body } => format!(
            "Commented on PR #{number}: {}…",
            snippet(body, options.snippet_chars)
        ),
        Interaction::Issue {
            number,
            action,
            title,
        } => format!("Issue #{number} {}: {title}", action.to_uppercase()),
        Interaction::IssueComment { number, body } => format!(
            "Commented on Issue #{number}: {}…",
            snippet(body, options.snippet_chars)
        ),
        Interaction::BranchCreated { ref_name } => format!("Created branch `{ref_name}`"),
    }
}

/// First line of `body`, cut to at most `max_chars` characters.
pub fn snippet(body: &str, max_chars: usize) -> &str {
    let line = first_line(body);
    line.char_indices()
        .nth(max_chars)
        .map_or(line, |(idx, _)| &line[..idx])
}

/// The full three-section text report.
pub fn render_text(summary: &Summary, options: &RenderOptions) -> String {
    let sections = [
        render_digest(&summary.digest),
        render_commits(&summary.commits),
        render_interactions(&summary.interactions, options),
    ];

    let mut output = String::new();
    for line in sections.iter().flatten() {
        output.push_str(line);
        output.push('\n');
    }
    output
}

/// Machine-readable variant of the report.
pub fn render_json(summary: &Summary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}
