//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use ghday_core::{AggregateOptions, MalformedPolicy, RenderOptions};
use ghday_github::ClientOptions;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Personal access token for the GitHub API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    /// Base URL of the REST API.
    pub api_url: String,
    /// Web host used in compare links.
    pub web_host: String,
    /// Directory `fetch` writes NDJSON files to.
    pub output_dir: PathBuf,
    /// Characters kept from the first line of comment bodies.
    pub snippet_chars: usize,
    /// Upper bound on event pages requested per fetch.
    pub max_pages: u32,
    pub request_timeout_secs: u64,
    /// Whether a malformed event aborts the summary or is skipped.
    pub on_malformed: MalformedPolicy,
    /// Fold each project on the rayon pool instead of one sequential pass.
    pub parallel: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "github_token",
                &self.github_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_url", &self.api_url)
            .field("web_host", &self.web_host)
            .field("output_dir", &self.output_dir)
            .field("snippet_chars", &self.snippet_chars)
            .field("max_pages", &self.max_pages)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("on_malformed", &self.on_malformed)
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let client = ClientOptions::default();
        Self {
            github_token: None,
            api_url: client.api_url,
            web_host: ghday_core::aggregate::DEFAULT_WEB_HOST.to_string(),
            output_dir: PathBuf::from("."),
            snippet_chars: ghday_core::render::DEFAULT_SNIPPET_CHARS,
            max_pages: client.max_pages,
            request_timeout_secs: client.timeout.as_secs(),
            on_malformed: MalformedPolicy::default(),
            parallel: false,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // The token variable other GitHub tooling already uses
        figment = figment.merge(
            Env::raw()
                .only(&["GH_TOKEN"])
                .map(|_| "github_token".into()),
        );

        // Load from environment variables (GHDAY_*)
        figment = figment.merge(Env::prefixed("GHDAY_"));

        figment.extract()
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            api_url: self.api_url.clone(),
            token: self.github_token.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            max_pages: self.max_pages,
            ..ClientOptions::default()
        }
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            web_host: self.web_host.clone(),
            on_malformed: self.on_malformed,
        }
    }

    pub const fn render_options(&self) -> RenderOptions {
        RenderOptions {
            snippet_chars: self.snippet_chars,
        }
    }
}

/// Returns the platform-specific config directory for ghday.
///
/// On Linux: `~/.config/ghday`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ghday"))
}
