//! GitHub events API client for the daily digest.
//!
//! Fetches a user's public event feed page by page and keeps the events that
//! fall on one calendar date (UTC).

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Default base URL of the REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// Default request timeout for API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
/// Default upper bound on pages requested per fetch.
pub const DEFAULT_MAX_PAGES: u32 = 10;
/// Events requested per page; the API's maximum.
pub const DEFAULT_PER_PAGE: usize = 100;
const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("ghday/", env!("CARGO_PKG_VERSION"));

/// Events API client errors.
#[derive(Debug, Error)]
pub enum GithubError {
    /// The user name cannot be used in a request path.
    #[error("invalid user name: {reason}")]
    InvalidUser { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The page limit was reached while the feed still held events for the day.
    #[error("reached the limit of {max_pages} pages before the start of the day; raise max_pages")]
    PageLimit { max_pages: u32 },
}

/// Settings for [`Client`].
#[derive(Clone)]
pub struct ClientOptions {
    pub api_url: String,
    /// Personal access token sent as a bearer token when present.
    pub token: Option<String>,
    pub timeout: Duration,
    pub max_pages: u32,
    /// Events requested per page; the API caps this at 100.
    pub per_page: usize,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("max_pages", &self.max_pages)
            .field("per_page", &self.per_page)
            .finish()
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            max_pages: DEFAULT_MAX_PAGES,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// GitHub events API client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
    max_pages: u32,
    per_page: usize,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(options: ClientOptions) -> Result<Self, GithubError> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(GithubError::ClientBuild)?;

        // A blank token would only earn a 401, so treat it as absent.
        let token = options.token.filter(|token| !token.trim().is_empty());

        Ok(Self {
            http,
            api_url: options.api_url.trim_end_matches('/').to_string(),
            token,
            max_pages: options.max_pages,
            per_page: options.per_page.max(1),
        })
    }

    /// Fetches all events `user` produced on `date` (UTC), oldest first.
    ///
    /// The API lists events newest first, so paging stops at the first page
    /// whose last event predates `date`, or at an empty or short page. Running
    /// out of pages before either happens is [`GithubError::PageLimit`], since
    /// a partial day would misrepresent activity.
    pub async fn fetch_day(&self, user: &str, date: NaiveDate) -> Result<Vec<Value>, GithubError> {
        validate_user(user)?;

        let mut kept = Vec::new();
        let mut complete = false;
        for page in 1..=self.max_pages {
            let events = self.fetch_page(user, page).await?;
            let reached_older = match events.last() {
                None => {
                    complete = true;
                    break;
                }
                Some(last) => event_date(last)? < date,
            };

            let fetched = events.len();
            for event in events {
                if event_date(&event)? == date {
                    kept.push(event);
                }
            }
            tracing::debug!(page, fetched, kept = kept.len(), "fetched events page");

            if reached_older || fetched < self.per_page {
                complete = true;
                break;
            }
        }

        if !complete {
            tracing::warn!(user, %date, max_pages = self.max_pages, "page limit reached");
            return Err(GithubError::PageLimit {
                max_pages: self.max_pages,
            });
        }

        kept.reverse();
        Ok(kept)
    }

    async fn fetch_page(&self, user: &str, page: u32) -> Result<Vec<Value>, GithubError> {
        let mut request = self
            .http
            .get(self.events_url(user, page))
            .header(reqwest::header::ACCEPT, ACCEPT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|err| GithubError::InvalidResponse(err.to_string()))
    }

    fn events_url(&self, user: &str, page: u32) -> String {
        format!(
            "{}/users/{user}/events?per_page={}&page={page}",
            self.api_url, self.per_page
        )
    }
}

/// Calendar date (UTC) of an event's `created_at`.
pub fn event_date(event: &Value) -> Result<NaiveDate, GithubError> {
    let created_at = event
        .get("created_at")
        .and_then(Value::as_str)
        .ok_or_else(|| GithubError::InvalidResponse("event without created_at".to_string()))?;
    let timestamp = DateTime::parse_from_rfc3339(created_at)
        .map_err(|err| GithubError::InvalidResponse(format!("bad created_at {created_at}: {err}")))?;
    Ok(timestamp.with_timezone(&Utc).date_naive())
}

fn validate_user(user: &str) -> Result<(), GithubError> {
    if user.trim().is_empty() {
        return Err(GithubError::InvalidUser {
            reason: "user name cannot be empty",
        });
    }
    if user.contains(['/', '?', '#']) {
        return Err(GithubError::InvalidUser {
            reason: "user name cannot contain '/', '?' or '#'",
        });
    }
    Ok(())
}

fn parse_api_error(status: u16, body: &str) -> GithubError {
    #[derive(Deserialize)]
    struct ErrorPayload {
        message: String,
    }

    let message = serde_json::from_str::<ErrorPayload>(body)
        .map_or_else(|_| body.to_string(), |payload| payload.message);
    GithubError::Api { status, message }
}
