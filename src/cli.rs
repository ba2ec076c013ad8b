//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and environment variable fallbacks.

use crate::analysis::PrState;
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Githouse - a tool to follow clubhouse tickets
///
/// Summarizes what a GitHub team shipped over a date window, with each
/// pull request filed under the Clubhouse story named in its branch.
///
/// Examples:
///   githouse users --gh-team platform
///   githouse report --gh-team platform
///   githouse report --start-date 2024-03-04 --end-date 2024-03-08 -o week.json
///   githouse report -f week.json
///   githouse init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Be verbose. More v's, more verbose.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors and hide progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .githouse.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the members of a GitHub team
    Users(UsersArgs),

    /// List stories completed in the date window
    ///
    /// Finds every PR by a team member in the date window, files it under
    /// the Clubhouse story named in its branch (e.g. `feature/ch123-login`)
    /// and prints a markdown summary per member.
    ///
    /// Each PR costs one extra GitHub request to read its branch, and each
    /// distinct story one Clubhouse request. Use a smaller date range if
    /// you get throttled.
    Report(ReportArgs),

    /// Generate a default .githouse.toml configuration file
    InitConfig,
}

/// GitHub coordinates shared by every command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GitHubArgs {
    /// The github access token to use
    #[arg(long, env = "GH_TOKEN", hide_env_values = true)]
    pub gh_token: Option<String>,

    /// The github team to use
    #[arg(long, env = "GH_TEAM")]
    pub gh_team: Option<String>,

    /// The github organization to use
    #[arg(long, env = "GH_ORG")]
    pub gh_org: Option<String>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct UsersArgs {
    #[command(flatten)]
    pub github: GitHubArgs,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ReportArgs {
    #[command(flatten)]
    pub github: GitHubArgs,

    /// The clubhouse access token to use
    #[arg(long, env = "CH_TOKEN", hide_env_values = true)]
    pub ch_token: Option<String>,

    /// The state the PR should be in [default: merged]
    #[arg(short, long, value_name = "STATE")]
    pub state: Option<PrState>,

    /// Start of date range for PRs to consider. Defaults to Monday of this week.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start_date: Option<NaiveDate>,

    /// End of date range for PRs to consider. Defaults to yesterday.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end_date: Option<NaiveDate>,

    /// Save json report data to OUTFILE
    #[arg(short, long, value_name = "OUTFILE")]
    pub outfile: Option<PathBuf>,

    /// A file to read an already pulled report from
    ///
    /// This avoids hitting github and clubhouse again.
    #[arg(short, long, value_name = "FILE", conflicts_with = "outfile")]
    pub filename: Option<PathBuf>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose > 0 && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Command::Report(ref args) = self.command {
            if let (Some(start), Some(end)) = (args.start_date, args.end_date) {
                if start > end {
                    return Err(format!(
                        "Start date {} is after end date {}",
                        start, end
                    ));
                }
            }

            if let Some(ref path) = args.filename {
                if !path.is_file() {
                    return Err(format!("Report file does not exist: {}", path.display()));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("githouse").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_report() {
        let cli = parse(&[
            "report",
            "--gh-team",
            "platform",
            "-s",
            "closed",
            "--start-date",
            "2024-03-04",
            "--end-date",
            "2024-03-08",
            "-o",
            "week.json",
        ]);

        let Command::Report(args) = cli.command else {
            panic!("expected report command");
        };
        assert_eq!(args.github.gh_team.as_deref(), Some("platform"));
        assert_eq!(args.state, Some(PrState::Closed));
        assert_eq!(args.start_date, NaiveDate::from_ymd_opt(2024, 3, 4));
        assert_eq!(args.end_date, NaiveDate::from_ymd_opt(2024, 3, 8));
        assert_eq!(args.outfile, Some(PathBuf::from("week.json")));
    }

    #[test]
    fn test_state_defaults_to_unset() {
        let cli = parse(&["report"]);
        let Command::Report(args) = cli.command else {
            panic!("expected report command");
        };
        assert_eq!(args.state, None);
    }

    #[test]
    fn test_rejects_bad_date_and_state() {
        let bad_date = Cli::try_parse_from(["githouse", "report", "--start-date", "03/04/2024"]);
        assert!(bad_date.is_err());

        let bad_state = Cli::try_parse_from(["githouse", "report", "-s", "reviewed"]);
        assert!(bad_state.is_err());
    }

    #[test]
    fn test_outfile_conflicts_with_filename() {
        let result = Cli::try_parse_from(["githouse", "report", "-o", "a.json", "-f", "b.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let cli = parse(&["-v", "--quiet", "users"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_validation_date_order() {
        let cli = parse(&[
            "report",
            "--start-date",
            "2024-03-08",
            "--end-date",
            "2024-03-04",
        ]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_validation_missing_report_file() {
        let cli = parse(&["report", "-f", "/definitely/not/here.json"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut cli = parse(&["users"]);
        assert_eq!(cli.log_level(), tracing::Level::WARN);

        cli.verbose = 1;
        assert_eq!(cli.log_level(), tracing::Level::INFO);

        cli.verbose = 3;
        assert_eq!(cli.log_level(), tracing::Level::DEBUG);

        cli.verbose = 0;
        cli.quiet = true;
        assert_eq!(cli.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["users", "-vv", "-c", "custom.toml"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Command::Users(_)));
    }
}
