//! End-to-end tests for the `ghday` binary.
//!
//! Exercises the file-based flow: NDJSON on disk → summary on stdout.
//! Nothing here touches the network.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const DAY: &str = r#"{"type":"PushEvent","repo":{"name":"zeta/app"},"created_at":"2025-04-22T08:00:00Z","payload":{"size":2,"ref":"refs/heads/main","commits":[{"sha":"abcdef1234","message":"fix bug\nlong body"},{"sha":"0987654321","message":"add test"}],"before":"aaa","head":"bbb"}}
{"type":"WatchEvent","repo":{"name":"zeta/app"},"created_at":"2025-04-22T08:30:00Z","payload":{"action":"started"}}
{"type":"PullRequestEvent","repo":{"name":"acme/web"},"created_at":"2025-04-22T09:00:00Z","payload":{"action":"opened","number":7,"pull_request":{"title":"Add login"}}}

{"type":"PullRequestReviewCommentEvent","repo":{"name":"acme/web"},"created_at":"2025-04-22T10:00:00Z","payload":{"pull_request":{"number":7,"title":"Add login"},"comment":{"body":"Please rename this helper\nit clashes with the other one"}}}
{"type":"CreateEvent","repo":{"name":"acme/web"},"created_at":"2025-04-22T11:00:00Z","payload":{"ref_type":"tag","ref":"v1.0.0"}}
"#;

const BROKEN: &str = r#"{"type":"IssuesEvent","repo":{"name":"acme/web"},"created_at":"2025-04-22T12:00:00Z","payload":{"action":"opened","issue":{"number":3}}}
"#;

fn ghday_binary() -> String {
    env!("CARGO_BIN_EXE_ghday").to_string()
}

/// Runs ghday with an isolated home so no user config leaks in.
fn run_ghday(home: &Path, args: &[&str]) -> Output {
    Command::new(ghday_binary())
        .env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("GH_TOKEN")
        .env_remove("GHDAY_ON_MALFORMED")
        .env_remove("GHDAY_WEB_HOST")
        .env_remove("GHDAY_SNIPPET_CHARS")
        .env_remove("GHDAY_PARALLEL")
        .args(args)
        .output()
        .expect("failed to run ghday")
}

fn write_file(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_summary_prints_all_sections() {
    let temp = TempDir::new().unwrap();
    let events = write_file(temp.path(), "octocat-2025-04-22.ndjson", DAY);

    let output = run_ghday(temp.path(), &["summary", &events]);
    assert!(
        output.status.success(),
        "summary should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).unwrap();

    let expected = "\
# Per-repo digest

* **acme/web** – 1 × pr opened, 1 × review comments
* **zeta/app** – 2 × push commits

# Commit roll-up

## zeta/app
### main
- abcdef1  fix bug
- 0987654  add test
↪\u{fe0e} compare diff: https://github.com/zeta/app/compare/aaa...bbb


# PR / Issue interaction summary

## acme/web
- PR #7: Add login
  - PR #7 OPENED
  - Commented on PR #7: Please rename this helper…


";
    assert_eq!(stdout, expected);
}

#[test]
fn test_summary_is_deterministic() {
    let temp = TempDir::new().unwrap();
    let events = write_file(temp.path(), "day.ndjson", DAY);

    let first = run_ghday(temp.path(), &["summary", &events]);
    let second = run_ghday(temp.path(), &["summary", &events]);
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_parallel_summary_matches_sequential() {
    let temp = TempDir::new().unwrap();
    let events = write_file(temp.path(), "day.ndjson", DAY);

    let sequential = run_ghday(temp.path(), &["summary", &events]);
    let parallel = run_ghday(temp.path(), &["summary", "--parallel", &events]);
    assert!(
        parallel.status.success(),
        "parallel summary should succeed: {}",
        String::from_utf8_lossy(&parallel.stderr)
    );
    assert_eq!(parallel.stdout, sequential.stdout);
}

#[test]
fn test_parallel_can_be_enabled_in_config() {
    let temp = TempDir::new().unwrap();
    let events = write_file(temp.path(), "broken.ndjson", &format!("{DAY}{BROKEN}"));
    let config = write_file(temp.path(), "ghday.toml", "parallel = true\n");

    let output = run_ghday(temp.path(), &["--config", &config, "summary", &events]);
    assert!(!output.status.success(), "malformed event should fail the run");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("IssuesEvent for acme/web"), "stderr: {stderr}");
    assert!(stderr.contains("issue.title"), "stderr: {stderr}");
}

#[test]
fn test_summary_of_empty_file_prints_headers() {
    let temp = TempDir::new().unwrap();
    let events = write_file(temp.path(), "empty.ndjson", "");

    let output = run_ghday(temp.path(), &["summary", &events]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout,
        "# Per-repo digest\n\n\n# Commit roll-up\n\n\n# PR / Issue interaction summary\n\n\n"
    );
}

#[test]
fn test_summary_aborts_on_malformed_event() {
    let temp = TempDir::new().unwrap();
    let events = write_file(temp.path(), "broken.ndjson", &format!("{DAY}{BROKEN}"));

    let output = run_ghday(temp.path(), &["summary", &events]);
    assert!(!output.status.success(), "malformed event should fail the run");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("malformed event on line 7"), "stderr: {stderr}");
    assert!(stderr.contains("issue.title"), "stderr: {stderr}");
}

#[test]
fn test_summary_skips_malformed_event_when_configured() {
    let temp = TempDir::new().unwrap();
    let events = write_file(temp.path(), "broken.ndjson", &format!("{BROKEN}{DAY}"));
    let config = write_file(
        temp.path(),
        "ghday.toml",
        "on_malformed = \"skip\"\nsnippet_chars = 6\n",
    );

    let output = run_ghday(temp.path(), &["--config", &config, "summary", &events]);
    assert!(
        output.status.success(),
        "summary should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("* **zeta/app** – 2 × push commits"));
    assert!(!stdout.contains("issue opened"));
    assert!(stdout.contains("  - Commented on PR #7: Please…"));
}

#[test]
fn test_summary_json_output() {
    let temp = TempDir::new().unwrap();
    let events = write_file(temp.path(), "day.ndjson", DAY);

    let output = run_ghday(temp.path(), &["summary", "--json", &events]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["digest"]["zeta/app"]["push_commits"], 2);
    assert_eq!(json["interactions"]["acme/web"]["pull_requests"]["7"]["title"], "Add login");
    assert_eq!(json["skipped"], 0);
}

#[test]
fn test_summary_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope.ndjson");

    let output = run_ghday(temp.path(), &["summary", &missing.to_string_lossy()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to open"));
}

#[test]
fn test_fetch_rejects_invalid_date() {
    let temp = TempDir::new().unwrap();

    let output = run_ghday(temp.path(), &["fetch", "octocat", "22/04/2025"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid date"));
}
