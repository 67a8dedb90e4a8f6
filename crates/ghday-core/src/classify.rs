//! Mapping raw events to the semantic actions the digest understands.

use serde_json::Value;
use thiserror::Error;

use crate::event::EventRecord;
use crate::event_kind::EventKind;
use crate::types::ProjectKey;

/// A recognized event whose payload lacks a field its kind requires.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("{kind} for {project} is missing required field `{field}`")]
    MissingField {
        project: ProjectKey,
        kind: EventKind,
        field: String,
    },
}

/// A single commit carried by a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushedCommit {
    pub sha: String,
    pub message: String,
}

/// Details of a push event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Push {
    /// Number of commits the platform reports for the push.
    pub size: u64,
    /// Full ref path, e.g. `refs/heads/main`.
    pub git_ref: String,
    pub commits: Vec<PushedCommit>,
    pub before: String,
    pub head: String,
}

/// What an event means for the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Push(Push),
    PullRequest {
        action: String,
        number: u64,
        title: String,
    },
    Review {
        number: u64,
        title: String,
        state: String,
    },
    ReviewComment {
        number: u64,
        title: String,
        body: String,
    },
    Issue {
        action: String,
        number: u64,
        title: String,
    },
    IssueComment {
        number: u64,
        body: String,
    },
    BranchCreated {
        ref_name: String,
    },
    /// The event contributes nothing to the digest.
    Ignored,
}

/// Classifies one event.
///
/// Unknown kinds, and creations of anything other than a branch, are
/// [`Action::Ignored`]. A recognized kind with a missing or mistyped field is
/// a [`DataError`].
pub fn classify(record: &EventRecord) -> Result<Action, DataError> {
    let fields = Fields { record };

    let action = match &record.kind {
        EventKind::Push => Action::Push(Push {
            size: fields.u64("size")?,
            git_ref: fields.string("ref")?,
            commits: fields.commits()?,
            before: fields.string("before")?,
            head: fields.string("head")?,
        }),
        EventKind::PullRequest => Action::PullRequest {
            action: fields.string("action")?,
            number: fields.u64("number")?,
            title: fields.string("pull_request.title")?,
        },
        EventKind::PullRequestReview => Action::Review {
            number: fields.u64("pull_request.number")?,
            title: fields.string("pull_request.title")?,
            state: fields.string("review.state")?,
        },
        EventKind::PullRequestReviewComment => Action::ReviewComment {
            number: fields.u64("pull_request.number")?,
            title: fields.string("pull_request.title")?,
            body: fields.string("comment.body")?,
        },
        EventKind::Issues => Action::Issue {
            action: fields.string("action")?,
            number: fields.u64("issue.number")?,
            title: fields.string("issue.title")?,
        },
        EventKind::IssueComment => Action::IssueComment {
            number: fields.u64("issue.number")?,
            body: fields.string("comment.body")?,
        },
        EventKind::Create => {
            if fields.string("ref_type")? == "branch" {
                Action::BranchCreated {
                    ref_name: fields.string("ref")?,
                }
            } else {
                Action::Ignored
            }
        }
        EventKind::Other(_) => Action::Ignored,
    };

    Ok(action)
}

/// Typed access to payload fields by dotted path.
struct Fields<'a> {
    record: &'a EventRecord,
}

impl<'a> Fields<'a> {
    fn lookup(&self, path: &str) -> Option<&'a Value> {
        let record: &'a EventRecord = self.record;
        path.split('.')
            .try_fold(&record.payload, |value, key| value.get(key))
    }

    fn string(&self, path: &str) -> Result<String, DataError> {
        self.lookup(path)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| self.missing(path))
    }

    fn u64(&self, path: &str) -> Result<u64, DataError> {
        self.lookup(path)
            .and_then(Value::as_u64)
            .ok_or_else(|| self.missing(path))
    }

    fn commits(&self) -> Result<Vec<PushedCommit>, DataError> {
        let items = self
            .lookup("commits")
            .and_then(Value::as_array)
            .ok_or_else(|| self.missing("commits"))?;

        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let field = |name: &str| {
                    item.get(name)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| self.missing(&format!("commits[{idx}].{name}")))
                };
                Ok(PushedCommit {
                    sha: field("sha")?,
                    message: field("message")?,
                })
            })
            .collect()
    }

    fn missing(&self, field: &str) -> DataError {
        DataError::MissingField {
            project: self.record.project_key.clone(),
            kind: self.record.kind.clone(),
            field: field.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn record(kind: EventKind, payload: Value) -> EventRecord {
        EventRecord::new(
            ProjectKey::new("octo/repo").unwrap(),
            kind,
            Utc::now(),
            payload,
        )
    }

    #[test]
    fn classifies_push() {
        let event = record(
            EventKind::Push,
            json!({
                "size": 1,
                "ref": "refs/heads/main",
                "commits": [{"sha": "abcdef1234", "message": "fix bug"}],
                "before": "aaa",
                "head": "bbb",
            }),
        );

        let action = classify(&event).unwrap();
        assert_eq!(
            action,
            Action::Push(Push {
                size: 1,
                git_ref: "refs/heads/main".to_string(),
                commits: vec![PushedCommit {
                    sha: "abcdef1234".to_string(),
                    message: "fix bug".to_string(),
                }],
                before: "aaa".to_string(),
                head: "bbb".to_string(),
            })
        );
    }

    #[test]
    fn classifies_pull_request_with_nested_title() {
        let event = record(
            EventKind::PullRequest,
            json!({"action": "opened", "number": 12, "pull_request": {"title": "Add login"}}),
        );
        assert_eq!(
            classify(&event).unwrap(),
            Action::PullRequest {
                action: "opened".to_string(),
                number: 12,
                title: "Add login".to_string(),
            }
        );
    }

    #[test]
    fn classifies_review_and_issue_comment() {
        let review = record(
            EventKind::PullRequestReview,
            json!({"pull_request": {"number": 3, "title": "T"}, "review": {"state": "approved"}}),
        );
        assert!(matches!(
            classify(&review).unwrap(),
            Action::Review { number: 3, ref state, .. } if state == "approved"
        ));

        let comment = record(
            EventKind::IssueComment,
            json!({"issue": {"number": 9}, "comment": {"body": "thanks"}}),
        );
        assert!(matches!(
            classify(&comment).unwrap(),
            Action::IssueComment { number: 9, ref body } if body == "thanks"
        ));
    }

    #[test]
    fn create_branch_is_recognized_but_tag_is_ignored() {
        let branch = record(
            EventKind::Create,
            json!({"ref_type": "branch", "ref": "feature/x"}),
        );
        assert_eq!(
            classify(&branch).unwrap(),
            Action::BranchCreated {
                ref_name: "feature/x".to_string()
            }
        );

        let tag = record(EventKind::Create, json!({"ref_type": "tag", "ref": "v1.0"}));
        assert_eq!(classify(&tag).unwrap(), Action::Ignored);

        let repo = record(EventKind::Create, json!({"ref_type": "repository", "ref": null}));
        assert_eq!(classify(&repo).unwrap(), Action::Ignored);
    }

    #[test]
    fn unknown_kinds_are_ignored() {
        let event = record(EventKind::Other("WatchEvent".to_string()), json!({}));
        assert_eq!(classify(&event).unwrap(), Action::Ignored);
    }

    #[test]
    fn missing_nested_field_is_named() {
        let event = record(
            EventKind::PullRequestReviewComment,
            json!({"pull_request": {"number": 3}, "comment": {"body": "hm"}}),
        );
        let err = classify(&event).unwrap_err();
        assert_eq!(
            err,
            DataError::MissingField {
                project: ProjectKey::new("octo/repo").unwrap(),
                kind: EventKind::PullRequestReviewComment,
                field: "pull_request.title".to_string(),
            }
        );
        assert_eq!(
            err.to_string(),
            "PullRequestReviewCommentEvent for octo/repo is missing required field `pull_request.title`"
        );
    }

    #[test]
    fn missing_commit_field_reports_index() {
        let event = record(
            EventKind::Push,
            json!({
                "size": 2,
                "ref": "refs/heads/main",
                "commits": [
                    {"sha": "abc", "message": "one"},
                    {"message": "two"},
                ],
                "before": "aaa",
                "head": "bbb",
            }),
        );
        let err = classify(&event).unwrap_err();
        assert!(err.to_string().contains("`commits[1].sha`"));
    }

    #[test]
    fn mistyped_field_is_a_data_error() {
        let event = record(
            EventKind::Issues,
            json!({"action": "opened", "issue": {"number": "7", "title": "Bug"}}),
        );
        let DataError::MissingField { field, .. } = classify(&event).unwrap_err();
        assert_eq!(field, "issue.number");
    }
}
