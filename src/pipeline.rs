//! The report pipeline.
//!
//! Fetches team members, searches their PRs, reads each PR's branch,
//! looks up the story it names and attributes the PR to its author.

use crate::analysis::{sort_by_author, story_id_from_branch, DateRange, PrState};
use crate::api::github::search_query;
use crate::api::{ApiError, ClubhouseClient, GitHubClient};
use crate::models::{Report, Story};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// What to report on.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub org: String,
    pub team: String,
    pub state: PrState,
    pub range: DateRange,
}

/// Runs the pipeline against live API clients.
pub struct ReportPipeline<'a> {
    github: &'a GitHubClient,
    clubhouse: &'a ClubhouseClient,
    show_progress: bool,
    stories: HashMap<u64, Option<Story>>,
}

impl<'a> ReportPipeline<'a> {
    pub fn new(
        github: &'a GitHubClient,
        clubhouse: &'a ClubhouseClient,
        show_progress: bool,
    ) -> Self {
        Self {
            github,
            clubhouse,
            show_progress,
            stories: HashMap::new(),
        }
    }

    /// Build the report for one team and window.
    pub async fn run(&mut self, request: &ReportRequest) -> Result<Report> {
        let members: Vec<String> = self
            .github
            .team_members(&request.org, &request.team)
            .await
            .with_context(|| {
                format!(
                    "Failed to list members of team {}/{}",
                    request.org, request.team
                )
            })?
            .into_iter()
            .map(|m| m.login)
            .collect();

        let mut report = Report::new(
            request.team.clone(),
            request.state,
            request.range.start,
            request.range.end,
            members,
        );

        if report.members.is_empty() {
            warn!("Team {} has no members, nothing to search", request.team);
            return Ok(report);
        }

        let query = search_query(&request.org, request.state, &request.range, &report.members);
        let mut items = self
            .github
            .search_pull_requests(&query)
            .await
            .context("GitHub PR search failed")?;
        info!("Total of {} PRs returned", items.len());

        sort_by_author(&mut items, |item| item.user.login.as_str());

        let progress = self.progress_bar(items.len());
        for item in items {
            progress.inc(1);

            let author = item.user.login;
            if !report.members.contains(&author) {
                debug!("Dropping PR #{} by non-member {}", item.number, author);
                continue;
            }
            let Some(pull) = item.pull_request else {
                continue;
            };

            let detail = self
                .github
                .pull_request(&pull.url)
                .await
                .with_context(|| format!("Failed to fetch PR {}", pull.url))?;

            if let Some(date) = detail.state_date(request.state) {
                if !request.range.contains(date) {
                    debug!(
                        "Dropping PR #{}: {} on {} is outside the window",
                        detail.number, request.state, date
                    );
                    continue;
                }
            }

            let pr = detail.into_pull_request();
            debug!("PR Branch = {}", pr.branch);

            let story = match story_id_from_branch(&pr.branch) {
                Some(id) => self.story(id).await?,
                None => None,
            };

            let Some(member) = report.member_mut(&author) else {
                continue;
            };
            match story {
                Some(story) => member.add_story_pr(story, pr),
                None => member.add_misc_pr(pr),
            }
        }
        progress.finish_and_clear();

        Ok(report)
    }

    /// Look up a story, at most once per id per run.
    ///
    /// Unknown stories resolve to `None` so their PRs land under misc.
    async fn story(&mut self, id: u64) -> Result<Option<Story>> {
        if let Some(cached) = self.stories.get(&id) {
            return Ok(cached.clone());
        }

        let story = match self.clubhouse.story(id).await {
            Ok(story) => Some(story),
            Err(ApiError::NotFound(_)) => {
                warn!("Story ch{} not found, listing its PR under misc", id);
                None
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context(format!("Failed to fetch story ch{}", id)))
            }
        };

        self.stories.insert(id, story.clone());
        Ok(story)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} PRs")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}
