//! GitHub REST API client.
//!
//! Covers the four calls the report needs: team lookup, team members,
//! issue search restricted to PRs, and single PR details.

use super::{send_json, ApiError, Page};
use crate::analysis::{DateRange, PrState};
use crate::models::{PullRequest, Team, TeamMember};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::RequestBuilder;
use serde::Deserialize;
use tracing::{debug, info, warn};

const PER_PAGE: &str = "100";

/// A GitHub user as embedded in API payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: String,
}

/// Response of `GET /search/issues`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<SearchItem>,
}

/// One search hit. Only PR hits carry `pull_request`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub number: u64,
    pub user: Account,
    #[serde(default)]
    pub pull_request: Option<PullRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRef {
    /// API URL of the PR detail record.
    pub url: String,
}

/// Response of `GET /repos/{owner}/{repo}/pulls/{number}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestDetail {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub user: Account,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    pub head: BranchRef,
    pub base: BranchRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchRef {
    #[serde(rename = "ref")]
    pub name: String,
    /// Null when the source fork was deleted.
    #[serde(default)]
    pub repo: Option<RepoRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoRef {
    pub name: String,
}

impl PullRequestDetail {
    /// The day the PR entered `state`, if it has.
    pub fn state_date(&self, state: PrState) -> Option<NaiveDate> {
        let at = match state {
            PrState::Merged => self.merged_at,
            PrState::Closed => self.closed_at,
            PrState::Updated => Some(self.updated_at),
            PrState::Created => Some(self.created_at),
        };
        at.map(|t| t.date_naive())
    }

    /// Flatten into the report's PR record.
    pub fn into_pull_request(self) -> PullRequest {
        let repo = self
            .head
            .repo
            .or(self.base.repo)
            .map(|r| r.name)
            .unwrap_or_default();

        PullRequest {
            author: self.user.login,
            repo,
            number: self.number,
            title: self.title,
            url: self.html_url,
            branch: self.head.name,
            merged_at: self.merged_at,
        }
    }
}

/// Build the PR search query for a team over a date window.
pub fn search_query(org: &str, state: PrState, range: &DateRange, members: &[String]) -> String {
    let mut query = format!("type:pr org:{} {}", org, range.qualifier(state));
    for member in members {
        query.push_str(" author:");
        query.push_str(member);
    }
    query
}

/// GitHub client authenticated with a personal access token.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(http: reqwest::Client, api_url: &str, token: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.http
            .get(url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
    }

    /// Look up a team by its slug.
    pub async fn team(&self, org: &str, slug: &str) -> Result<Team, ApiError> {
        let url = format!("{}/orgs/{}/teams/{}", self.api_url, org, slug);
        info!("Getting team {}/{}", org, slug);

        let page: Page<Team> = send_json(self.get(&url), &url).await?;
        Ok(page.body)
    }

    /// List every member of a team, following pagination.
    pub async fn team_members(&self, org: &str, slug: &str) -> Result<Vec<TeamMember>, ApiError> {
        let url = format!("{}/orgs/{}/teams/{}/members", self.api_url, org, slug);

        let mut page: Page<Vec<TeamMember>> =
            send_json(self.get(&url).query(&[("per_page", PER_PAGE)]), &url).await?;
        let mut members = std::mem::take(&mut page.body);

        while let Some(next) = page.next.take() {
            debug!("Following members page {}", next);
            page = send_json(self.get(&next), &next).await?;
            members.append(&mut page.body);
        }

        info!("Team {} has {} members", slug, members.len());
        Ok(members)
    }

    /// Run an issue search and return every PR hit across all pages.
    ///
    /// Non-PR hits are skipped.
    pub async fn search_pull_requests(&self, query: &str) -> Result<Vec<SearchItem>, ApiError> {
        let url = format!("{}/search/issues", self.api_url);
        info!("Github PR query: {}", query);

        let mut page: Page<SearchResults> = send_json(
            self.get(&url).query(&[("q", query), ("per_page", PER_PAGE)]),
            &url,
        )
        .await?;
        debug!("Search reports {} total hits", page.body.total_count);
        let mut items = std::mem::take(&mut page.body.items);

        while let Some(next) = page.next.take() {
            debug!("Following search page {}", next);
            page = send_json(self.get(&next), &next).await?;
            items.append(&mut page.body.items);
        }

        if page.body.incomplete_results {
            warn!("GitHub reported incomplete search results");
        }

        let total = items.len();
        items.retain(|item| item.pull_request.is_some());
        if items.len() < total {
            debug!("Skipped {} non-PR search hits", total - items.len());
        }

        Ok(items)
    }

    /// Fetch a PR detail record by its API URL.
    pub async fn pull_request(&self, url: &str) -> Result<PullRequestDetail, ApiError> {
        let page: Page<PullRequestDetail> = send_json(self.get(url), url).await?;
        Ok(page.body)
    }
}
