//! Markdown report generation.
//!
//! This module renders the team report as markdown and saves or loads
//! the JSON form so a report can be reprinted without hitting the APIs.

use crate::models::{MemberReport, PullRequest, Report, StoryWork};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate the complete markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "# {} Updates {} - {}\n",
        pretty_team_name(&report.team),
        report.start_date.format("%Y-%m-%d"),
        report.end_date.format("%Y-%m-%d")
    ));

    let mut members: Vec<&String> = report.members.iter().collect();
    members.sort();

    let empty = MemberReport::default();
    for login in members {
        let member_report = report.report.get(login).unwrap_or(&empty);
        output.push_str(&generate_member_section(login, member_report));
    }

    output
}

/// Generate one member's section.
fn generate_member_section(login: &str, report: &MemberReport) -> String {
    let mut section = String::new();

    let ies = if report.total_stories != 1 { "ies" } else { "y" };
    let s = if report.total_prs != 1 { "s" } else { "" };
    section.push_str(&format!(
        "\n## {} ({} Stor{}; {} PR{})\n",
        login, report.total_stories, ies, report.total_prs, s
    ));

    for work in &report.stories {
        section.push_str(&generate_story_block(work));
    }

    if !report.misc_prs.is_empty() {
        section.push_str(" * Misc PRs\n");
        for pr in &report.misc_prs {
            section.push_str(&generate_pr_line(pr));
        }
    }

    section
}

fn generate_story_block(work: &StoryWork) -> String {
    let story = &work.story;
    let mut block = format!(
        " * [{} ch{}]({}): {}\n",
        capitalize(&story.story_type),
        story.id,
        story.app_url,
        story.name
    );

    for pr in &work.prs {
        block.push_str(&generate_pr_line(pr));
    }

    block
}

fn generate_pr_line(pr: &PullRequest) -> String {
    format!("   * [#{}/{}]({}): {}\n", pr.repo, pr.number, pr.url, pr.title)
}

/// Generate the `users` listing: a header and one login per line, sorted.
pub fn generate_members_listing(team_name: &str, logins: &[String]) -> String {
    let mut sorted: Vec<&String> = logins.iter().collect();
    sorted.sort();

    let mut listing = format!("Team Members in @{}\n", team_name);
    for login in sorted {
        listing.push_str(&format!("\t{}\n", login));
    }
    listing
}

/// Turn a team slug into a heading: `platform_team` becomes `Platform Team`.
pub fn pretty_team_name(team: &str) -> String {
    let mut spaced = String::with_capacity(team.len());
    let mut in_separator = false;
    for c in team.chars() {
        if c == '_' || c == '-' {
            if !in_separator {
                spaced.push(' ');
            }
            in_separator = true;
        } else {
            spaced.push(c);
            in_separator = false;
        }
    }

    title_case(&spaced)
}

/// Uppercase the first letter of each run of letters, lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a JSON report to a file.
pub fn write_json_report(report: &Report, path: &Path) -> Result<()> {
    let content = generate_json_report(report)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

/// Load a JSON report saved by [`write_json_report`].
pub fn load_json_report(path: &Path) -> Result<Report> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse report file: {}", path.display()))
}

/// Load a saved report for reprinting, optionally under another team name.
pub fn load_saved_report(path: &Path, team: Option<&str>) -> Result<Report> {
    let mut report = load_json_report(path)?;
    if let Some(team) = team {
        report.team = team.to_string();
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PrState;
    use crate::models::Story;
    use chrono::NaiveDate;

    const SAVED_REPORT: &str = include_str!("../../fixtures/report.json");

    const SAVED_REPORT_MARKDOWN: &str = "\
# Platform Team Updates 2024-03-04 - 2024-03-08

## alice (1 Story; 1 PR)
 * [Feature ch123](https://app.clubhouse.io/acme/story/123): Throttle failed logins
   * [#api/7](https://github.com/acme/api/pull/7): Add login throttling

## bob (0 Stories; 2 PRs)
 * Misc PRs
   * [#web/12](https://github.com/acme/web/pull/12): Bump eslint
   * [#web/13](https://github.com/acme/web/pull/13): Fix footer links

## carol (0 Stories; 0 PRs)
";

    fn create_test_report() -> Report {
        let mut report = Report::new(
            "data-eng",
            PrState::Merged,
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            vec!["zed".to_string(), "amy".to_string()],
        );

        let story = Story {
            id: 88,
            name: "Nightly export".to_string(),
            story_type: "BUG".to_string(),
            app_url: "https://app.clubhouse.io/acme/story/88".to_string(),
        };
        let pr = |number: u64| PullRequest {
            author: "zed".to_string(),
            repo: "etl".to_string(),
            number,
            title: format!("Export fix {}", number),
            url: format!("https://github.com/acme/etl/pull/{}", number),
            branch: "zed/ch88-export".to_string(),
            merged_at: None,
        };

        let zed = report.member_mut("zed").unwrap();
        zed.add_story_pr(story.clone(), pr(1));
        zed.add_story_pr(story, pr(2));
        report
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_report());

        assert_eq!(
            markdown,
            "\
# Data Eng Updates 2024-03-04 - 2024-03-08

## amy (0 Stories; 0 PRs)

## zed (1 Story; 2 PRs)
 * [Bug ch88](https://app.clubhouse.io/acme/story/88): Nightly export
   * [#etl/1](https://github.com/acme/etl/pull/1): Export fix 1
   * [#etl/2](https://github.com/acme/etl/pull/2): Export fix 2
"
        );
    }

    #[test]
    fn test_saved_report_renders() {
        let report: Report = serde_json::from_str(SAVED_REPORT).unwrap();
        assert_eq!(generate_markdown_report(&report), SAVED_REPORT_MARKDOWN);
    }

    #[test]
    fn test_json_round_trip_renders_identical_markdown() {
        let report = create_test_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        write_json_report(&report, &path).unwrap();
        let loaded = load_json_report(&path).unwrap();

        assert_eq!(loaded, report);
        assert_eq!(
            generate_markdown_report(&loaded),
            generate_markdown_report(&report)
        );
    }

    #[test]
    fn test_saved_report_team_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("week.json");
        std::fs::write(&path, SAVED_REPORT).unwrap();

        let kept = load_saved_report(&path, None).unwrap();
        assert_eq!(kept.team, "platform_team");

        let renamed = load_saved_report(&path, Some("growth-squad")).unwrap();
        let markdown = generate_markdown_report(&renamed);
        assert!(markdown.starts_with("# Growth Squad Updates 2024-03-04 - 2024-03-08\n"));
        assert_eq!(renamed.report, kept.report);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, "{\"members\": []}").unwrap();

        assert!(load_json_report(&path).is_err());
        assert!(load_json_report(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_pretty_team_name() {
        assert_eq!(pretty_team_name("platform_team"), "Platform Team");
        assert_eq!(pretty_team_name("data--eng__core"), "Data Eng Core");
        assert_eq!(pretty_team_name("SRE"), "Sre");
        assert_eq!(pretty_team_name("team2go"), "Team2Go");
    }

    #[test]
    fn test_generate_members_listing() {
        let listing = generate_members_listing(
            "Platform Team",
            &["carol".to_string(), "alice".to_string()],
        );
        assert_eq!(listing, "Team Members in @Platform Team\n\talice\n\tcarol\n");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("feature"), "Feature");
        assert_eq!(capitalize("CHORE"), "Chore");
        assert_eq!(capitalize(""), "");
    }
}
