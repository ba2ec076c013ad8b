//! Githouse - weekly team updates from GitHub and Clubhouse
//!
//! A CLI tool that collects the pull requests a GitHub team merged in a
//! date window, files each under the Clubhouse story named in its branch,
//! and prints a markdown summary per team member.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing credentials, API failure, bad report file, etc.)

mod analysis;
mod api;
mod cli;
mod config;
mod models;
mod pipeline;
mod report;
#[cfg(test)]
mod testing;

use analysis::DateRange;
use anyhow::{Context, Result};
use api::{build_http_client, ClubhouseClient, GitHubClient};
use chrono::Local;
use cli::{Cli, Command, ReportArgs, UsersArgs};
use config::{Config, CONFIG_FILE};
use pipeline::{ReportPipeline, ReportRequest};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Validate arguments
    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = cli.command {
        return handle_init_config(Path::new(CONFIG_FILE));
    }

    init_logging(&cli)?;

    info!("Githouse v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", cli.command);

    let result = match cli.command {
        Command::Users(ref args) => run_users(&cli, args).await,
        Command::Report(ref args) => run_report(&cli, args).await,
        Command::InitConfig => Ok(()),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle init-config: generate a default .githouse.toml.
fn handle_init_config(path: &Path) -> Result<()> {
    if let Err(e) = Config::write_default(path) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    println!("Created {} with default settings.", path.display());
    println!("Set org and team there, and keep tokens in GH_TOKEN and CH_TOKEN.");
    Ok(())
}

/// Initialize logging on stderr so stdout carries only the report.
fn init_logging(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().as_str().to_lowercase()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load configuration from file or use defaults.
fn load_config(cli: &Cli) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = cli.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

/// List the members of the configured team.
async fn run_users(cli: &Cli, args: &UsersArgs) -> Result<()> {
    let mut config = load_config(cli)?;
    config.merge_github_args(&args.github);
    let target = config.github_target()?;

    let http = build_http_client(&config.http)?;
    let github = GitHubClient::new(http, &target.api_url, &target.token);

    let team = github
        .team(&target.org, &target.team)
        .await
        .with_context(|| format!("Failed to get team {}/{}", target.org, target.team))?;
    let members = github
        .team_members(&target.org, &target.team)
        .await
        .with_context(|| format!("Failed to list members of {}", team.slug))?;

    let logins: Vec<String> = members.into_iter().map(|m| m.login).collect();
    print!("{}", report::generate_members_listing(&team.name, &logins));
    Ok(())
}

/// Build (or load) the team report and print it as markdown.
async fn run_report(cli: &Cli, args: &ReportArgs) -> Result<()> {
    let mut config = load_config(cli)?;
    config.merge_report_args(args);

    let team_report = match args.filename {
        Some(ref path) => {
            info!("Loading saved report from {}", path.display());
            report::load_saved_report(path, args.github.gh_team.as_deref())?
        }
        None => {
            let target = config.github_target()?;
            let ch_token = config.clubhouse_token()?;
            let range = DateRange::resolve(args.start_date, args.end_date, Local::now().date_naive())?;

            let http = build_http_client(&config.http)?;
            let github = GitHubClient::new(http.clone(), &target.api_url, &target.token);
            let clubhouse = ClubhouseClient::new(http, &config.clubhouse.api_url, &ch_token);

            let request = ReportRequest {
                org: target.org,
                team: target.team,
                state: config.report.state,
                range,
            };
            let built = ReportPipeline::new(&github, &clubhouse, !cli.quiet)
                .run(&request)
                .await?;

            if let Some(ref outfile) = args.outfile {
                report::write_json_report(&built, outfile)?;
                warn!("Full report saved to {}", outfile.display());
            }
            built
        }
    };

    info!(
        "{} members, {} stories, {} PRs",
        team_report.members.len(),
        team_report.total_stories(),
        team_report.total_prs()
    );
    for (login, member) in &team_report.report {
        debug!("{}: {} stories, {} PRs", login, member.total_stories, member.total_prs);
    }

    print!("{}", report::generate_markdown_report(&team_report));
    Ok(())
}
