//! Configuration file handling.
//!
//! This module handles loading `.githouse.toml` and merging it with
//! CLI flags and environment variables.

use crate::analysis::PrState;
use crate::cli::{GitHubArgs, ReportArgs};
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".githouse.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// GitHub settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Clubhouse settings.
    #[serde(default)]
    pub clubhouse: ClubhouseConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL.
    #[serde(default = "default_github_url")]
    pub api_url: String,

    /// Organization that owns the team.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,

    /// Team slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,

    /// Personal access token. Prefer the GH_TOKEN env var.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_url(),
            org: None,
            team: None,
            token: None,
        }
    }
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

/// Clubhouse API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubhouseConfig {
    /// REST API base URL.
    #[serde(default = "default_clubhouse_url")]
    pub api_url: String,

    /// API token. Prefer the CH_TOKEN env var.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ClubhouseConfig {
    fn default() -> Self {
        Self {
            api_url: default_clubhouse_url(),
            token: None,
        }
    }
}

fn default_clubhouse_url() -> String {
    "https://api.clubhouse.io/api/v3".to_string()
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent to both APIs.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("githouse/{}", env!("CARGO_PKG_VERSION"))
}

/// Report settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// PR state the date window applies to.
    #[serde(default)]
    pub state: PrState,
}

/// GitHub credentials and team coordinates, all present.
#[derive(Debug, Clone)]
pub struct GitHubTarget {
    pub api_url: String,
    pub token: String,
    pub org: String,
    pub team: String,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge GitHub flags into this configuration.
    ///
    /// Flags (and their env vars) take precedence over file settings.
    pub fn merge_github_args(&mut self, args: &GitHubArgs) {
        if let Some(ref token) = args.gh_token {
            self.github.token = Some(token.clone());
        }
        if let Some(ref team) = args.gh_team {
            self.github.team = Some(team.clone());
        }
        if let Some(ref org) = args.gh_org {
            self.github.org = Some(org.clone());
        }
    }

    /// Merge report flags into this configuration.
    pub fn merge_report_args(&mut self, args: &ReportArgs) {
        self.merge_github_args(&args.github);

        if let Some(ref token) = args.ch_token {
            self.clubhouse.token = Some(token.clone());
        }
        if let Some(state) = args.state {
            self.report.state = state;
        }
    }

    /// The GitHub coordinates, failing on the first missing one.
    pub fn github_target(&self) -> Result<GitHubTarget> {
        let token = require(
            &self.github.token,
            "A github token is required. Use --gh-token option or GH_TOKEN env var",
        )?;
        let team = require(
            &self.github.team,
            "A github team is required. Use the --gh-team option or GH_TEAM env var",
        )?;
        let org = require(
            &self.github.org,
            "A github org is required. Use the --gh-org option or GH_ORG env var",
        )?;

        Ok(GitHubTarget {
            api_url: self.github.api_url.clone(),
            token,
            org,
            team,
        })
    }

    /// The Clubhouse token, failing if absent.
    pub fn clubhouse_token(&self) -> Result<String> {
        require(
            &self.clubhouse.token,
            "A clubhouse token is required. Use --ch-token option or CH_TOKEN env var",
        )
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }

    /// Write [`Config::default_toml`] to `path`, refusing to replace a file.
    pub fn write_default(path: &Path) -> Result<()> {
        if path.exists() {
            bail!(
                "{} already exists. Remove it first or edit it manually.",
                path.display()
            );
        }

        std::fs::write(path, Self::default_toml())
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

fn require(value: &Option<String>, message: &str) -> Result<String> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{}", message))
}
