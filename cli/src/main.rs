//! CLI for the GitHub Reporter.
//!
//! `serve` hosts the rating server; `report` loads rated pages through the
//! local cache and prints them as a table.

use clap::{Args, Parser, Subcommand};
use github_reporter::{
    ClientError, ConfigError, FileStore, GitHubPageSource, HttpTransport, PageClient, Pager,
    RatedRepository, ReporterConfig, ServerError,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// GitHub Reporter - Rate an organization's repositories.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a config.toml with rating thresholds and cache settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the rating server.
    Serve(ServeArgs),
    /// Print rated repositories of an organization.
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// Maximum repositories rated concurrently (overrides the config file).
    #[arg(long)]
    concurrency: Option<usize>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Organization to report on.
    #[arg(long)]
    org: String,

    /// GitHub Personal Access Token.
    #[arg(long, env = "GITHUB_TOKEN", default_value = "", hide_env_values = true)]
    token: String,

    /// Rating server URL (overrides the config file).
    #[arg(long)]
    server_url: Option<String>,

    /// Number of pages to load.
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// Load every page.
    #[arg(long, conflicts_with = "pages")]
    all: bool,

    /// Ignore fresh cache entries for the first page.
    #[arg(long)]
    refresh: bool,

    /// Only show repositories whose name contains this text.
    #[arg(long)]
    filter: Option<String>,

    /// Directory for the page cache.
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

/// Errors that end the CLI run.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] github_reporter::CacheError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("No cache directory available; pass --cache-dir")]
    NoCacheDir,
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            // The data could not be loaded, but the setup was fine.
            Self::Client(
                ClientError::ListingFailed { .. } | ClientError::TransportFailed { .. },
            ) => ExitCode::from(1),
            _ => ExitCode::from(2),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    init_tracing();

    // Parse arguments
    let cli = Cli::parse();

    // Run the main logic
    match run(cli).await {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            error!(error = %e, "Critical failure");
            e.exit_code()
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Main execution logic.
async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ReporterConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Serve(args) => serve(args, config).await,
        Command::Report(args) => report(args, config).await,
    }
}

async fn serve(args: ServeArgs, config: ReporterConfig) -> Result<(), CliError> {
    let concurrency = args.concurrency.unwrap_or(config.concurrency).max(1);
    let source = GitHubPageSource::new(config.rating, concurrency);
    let addr = SocketAddr::new(args.host, args.port);
    github_reporter::serve(addr, source).await?;
    Ok(())
}

async fn report(args: ReportArgs, config: ReporterConfig) -> Result<(), CliError> {
    let server_url = args.server_url.unwrap_or(config.server.url);
    let cache_dir = match args.cache_dir {
        Some(dir) => dir,
        None => dirs::cache_dir()
            .ok_or(CliError::NoCacheDir)?
            .join("github-reporter"),
    };

    let transport = HttpTransport::new(&server_url)?;
    let store = FileStore::open(&cache_dir)?;
    let client = PageClient::new(transport, store).with_expiry(config.cache.expiry());
    let mut pager = Pager::new(client, args.org.clone(), args.token);

    let mut any_from_cache = pager.load_first(args.refresh).await?;
    let mut loaded = 1;
    while args.all || loaded < args.pages {
        match pager.load_more().await? {
            Some(from_cache) => any_from_cache |= from_cache,
            None => break,
        }
        loaded += 1;
    }

    let state = pager.state();
    let shown = state.filtered(args.filter.as_deref().unwrap_or(""));
    print_table(&args.org, &shown);

    println!(
        "\n  {} of {} repositories shown{}{}",
        shown.len(),
        state.repositories().len(),
        if state.has_more() {
            " (more available)"
        } else {
            ""
        },
        if any_from_cache { " [cached]" } else { "" }
    );
    Ok(())
}

/// Prints the rated repositories.
fn print_table(org: &str, repositories: &[&RatedRepository]) {
    println!("\nRepositories of {org}:");
    println!(
        "  {:<30} {:<40} {:>6} {:>8} {:>6} {:>7}",
        "Repository", "Description", "Rating", "README", "Stale", "Old PRs"
    );

    for repo in repositories {
        let details = &repo.rating_details;
        println!(
            "  {:<30} {:<40} {:>6} {:>8} {:>6} {:>7}",
            truncate(repo.name(), 30),
            truncate(repo.repository.description.as_deref().unwrap_or("N/A"), 40),
            repo.rating(),
            readme_label(details.readme.score),
            details.stale_branches.count.unwrap_or(0),
            details.old_pull_requests.count.unwrap_or(0),
        );
    }
}

fn readme_label(score: u8) -> &'static str {
    match score {
        0 => "missing",
        1 => "short",
        _ => "long",
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-name", 10), "a-very-...");
    }

    #[test]
    fn labels_readme_scores() {
        assert_eq!(readme_label(0), "missing");
        assert_eq!(readme_label(1), "short");
        assert_eq!(readme_label(3), "long");
    }

    #[test]
    fn parses_report_arguments() {
        let cli = Cli::try_parse_from([
            "github-reporter",
            "report",
            "--org",
            "acme",
            "--token",
            "t",
            "--all",
            "--filter",
            "api",
        ])
        .unwrap();

        match cli.command {
            Command::Report(args) => {
                assert_eq!(args.org, "acme");
                assert!(args.all);
                assert_eq!(args.filter.as_deref(), Some("api"));
            }
            Command::Serve(_) => panic!("expected report"),
        }
    }

    #[test]
    fn serve_listens_on_all_interfaces_by_default() {
        let cli = Cli::try_parse_from(["github-reporter", "serve", "--port", "8080"]).unwrap();

        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
                assert_eq!(args.port, 8080);
            }
            Command::Report(_) => panic!("expected serve"),
        }
    }

    #[test]
    fn serve_accepts_host() {
        let cli =
            Cli::try_parse_from(["github-reporter", "serve", "--host", "127.0.0.1"]).unwrap();

        match cli.command {
            Command::Serve(args) => assert_eq!(args.host, IpAddr::V4(Ipv4Addr::LOCALHOST)),
            Command::Report(_) => panic!("expected serve"),
        }
    }
}
