//! Data models for the team report.
//!
//! This module contains the records fetched from GitHub and Clubhouse
//! and the per-member report built from them.

use crate::analysis::window::PrState;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A member of a GitHub team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// GitHub username.
    pub login: String,
}

/// A GitHub team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Display name, e.g. "Platform Team".
    pub name: String,
    /// URL slug, e.g. "platform-team".
    pub slug: String,
}

/// A pull request attributed to a team member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Login of the PR author.
    pub author: String,
    /// Name of the repository the PR lives in.
    pub repo: String,
    /// PR number within the repository.
    pub number: u64,
    /// PR title.
    pub title: String,
    /// Browser URL of the PR.
    pub url: String,
    /// Head branch name.
    pub branch: String,
    /// When the PR was merged, if it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

/// A Clubhouse story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Story id, the digits in `ch123`.
    pub id: u64,
    /// Story title.
    pub name: String,
    /// Type label: feature, bug or chore.
    pub story_type: String,
    /// Browser URL of the story.
    pub app_url: String,
}

/// A story together with the PRs that worked on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryWork {
    #[serde(flatten)]
    pub story: Story,
    pub prs: Vec<PullRequest>,
}

/// Everything one member did in the date window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberReport {
    /// Stories in the order they were first seen.
    pub stories: Vec<StoryWork>,
    /// PRs whose branch names no story.
    pub misc_prs: Vec<PullRequest>,
    /// Number of stories.
    pub total_stories: usize,
    /// Number of PRs across stories and misc.
    pub total_prs: usize,
}

impl MemberReport {
    /// Attribute a PR to a story, adding the story on first sight.
    pub fn add_story_pr(&mut self, story: Story, pr: PullRequest) {
        match self.stories.iter_mut().find(|s| s.story.id == story.id) {
            Some(work) => work.prs.push(pr),
            None => self.stories.push(StoryWork {
                story,
                prs: vec![pr],
            }),
        }
        self.recount();
    }

    /// Attribute a PR that has no story.
    pub fn add_misc_pr(&mut self, pr: PullRequest) {
        self.misc_prs.push(pr);
        self.recount();
    }

    /// Recompute the totals from the lists.
    pub fn recount(&mut self) {
        self.total_stories = self.stories.len();
        self.total_prs =
            self.stories.iter().map(|s| s.prs.len()).sum::<usize>() + self.misc_prs.len();
    }
}

/// The complete team report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Team slug the report was built for.
    pub team: String,
    /// PR state the date window applies to.
    pub state: PrState,
    /// First day of the window (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the window (inclusive).
    pub end_date: NaiveDate,
    /// Every listed team member, with or without work.
    pub members: Vec<String>,
    /// Work per member login. Members without work are absent.
    pub report: BTreeMap<String, MemberReport>,
}

impl Report {
    /// Creates an empty report for the given members.
    pub fn new(
        team: impl Into<String>,
        state: PrState,
        start_date: NaiveDate,
        end_date: NaiveDate,
        members: Vec<String>,
    ) -> Self {
        Self {
            team: team.into(),
            state,
            start_date,
            end_date,
            members,
            report: BTreeMap::new(),
        }
    }

    /// Returns the mutable report of a listed member.
    ///
    /// Returns `None` for logins that are not team members, so their work
    /// is dropped.
    pub fn member_mut(&mut self, login: &str) -> Option<&mut MemberReport> {
        if !self.members.iter().any(|m| m == login) {
            return None;
        }
        Some(self.report.entry(login.to_string()).or_default())
    }

    /// Total PRs across all members.
    pub fn total_prs(&self) -> usize {
        self.report.values().map(|r| r.total_prs).sum()
    }

    /// Total stories across all members.
    pub fn total_stories(&self) -> usize {
        self.report.values().map(|r| r.total_stories).sum()
    }
}
