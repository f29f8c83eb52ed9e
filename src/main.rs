//! Outlink-Audit main entry point
//!
//! This is the command-line interface for the outbound-link auditor and the
//! CI checks that run alongside it.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use outlink_audit::checks::{
    check_for_output, check_geo_consistency, validate_feeds, GeoConsistency, Notifier,
    OutputCheck, RunContext,
};
use outlink_audit::config::{RetryPolicy, ScanSettings};
use outlink_audit::crawler::{build_http_client, run_scan, BatchSpec, PageFetcher, ScanRequest};
use outlink_audit::output::PAGE_CACHE_DIR;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Outlink-Audit: an outbound-link auditor
///
/// Crawls a site from its sitemap (or explicit page URLs), extracts every
/// outbound link and reports the ones its allowlist does not expect.
#[derive(Parser, Debug)]
#[command(name = "outlink-audit")]
#[command(version = "1.0.0")]
#[command(about = "An outbound-link auditor for sitemap-seeded sites", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Directory reports and page dumps are written to
    #[arg(long, global = true, default_value = "output")]
    output_dir: PathBuf,

    /// User-Agent header sent with every request
    #[arg(long, global = true, env = "USER_AGENT")]
    user_agent: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan pages for unexpected outbound URLs
    Scan(ScanArgs),

    /// Check that a site's RSS/Atom feeds are well-formed
    ValidateFeeds(FeedArgs),

    /// Look for scan reports and send a notification if there are any
    CheckOutput(NotifyArgs),

    /// Check that all exported pages carry the same CDN country code
    CheckGeo(NotifyArgs),
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// URL of a sitemap or sitemap index
    #[arg(long)]
    sitemap_url: Option<String>,

    /// Keep sitemap URLs on the sitemap's own scheme and host
    #[arg(long)]
    maintain_hostname: bool,

    /// A page to check; may be given more than once
    #[arg(long = "specific-url", value_name = "URL")]
    specific_urls: Vec<String>,

    /// Which slice of the URL universe to check, as INDEX:TOTAL
    #[arg(long, default_value = "1:1")]
    batch: BatchSpec,

    /// Allowlist YAML file
    #[arg(long, env = "ALLOWLIST_FILEPATH")]
    allowlist: PathBuf,

    /// YAML file of extra paths to check on the same host
    #[arg(long, env = "EXTRA_URLS_FILEPATH")]
    additional_urls_file: Option<PathBuf>,

    /// Dump cached pages to the output directory when done
    #[arg(long)]
    export_cache: bool,

    /// Maximum sitemap index nesting to follow
    #[arg(long)]
    max_sitemap_depth: Option<usize>,
}

#[derive(Args, Debug)]
struct FeedArgs {
    /// Hostname of the site hosting the feeds, e.g. www.example.com
    #[arg(long)]
    hostname: String,

    /// Feed configuration YAML file
    #[arg(long, env = "FEED_CONFIG_FILENAME", default_value = "data/feeds-to-check.yaml")]
    feed_config: PathBuf,
}

#[derive(Args, Debug)]
struct NotifyArgs {
    /// Chat webhook to notify; notifications are skipped when unset
    #[arg(long, env = "SLACK_NOTIFICATION_WEBHOOK_URL")]
    webhook_url: Option<String>,

    #[arg(long, env = "GITHUB_SERVER_URL", default_value = "NO-GITHUB")]
    github_server_url: String,

    #[arg(long, env = "GITHUB_REPOSITORY", default_value = "NO-REPOSITORY-IN-USE")]
    github_repository: String,

    #[arg(long, env = "GITHUB_RUN_ID", default_value = "NO-RUN-NUMBER")]
    github_run_id: String,
}

impl NotifyArgs {
    fn run_context(&self) -> RunContext {
        RunContext::new(
            &self.github_server_url,
            &self.github_repository,
            &self.github_run_id,
        )
    }

    fn notifier(&self, user_agent: Option<&str>) -> anyhow::Result<Notifier> {
        let client = build_http_client(user_agent).context("Failed to build HTTP client")?;
        Ok(Notifier::new(client, self.webhook_url.clone()))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let settings = ScanSettings {
        user_agent: cli.user_agent.clone(),
        output_dir: cli.output_dir.clone(),
        ..ScanSettings::default()
    };

    let result = match cli.command {
        Command::Scan(args) => handle_scan(settings, args).await,
        Command::ValidateFeeds(args) => handle_validate_feeds(settings, args).await,
        Command::CheckOutput(args) => handle_check_output(settings, args).await,
        Command::CheckGeo(args) => handle_check_geo(settings, args).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("outlink_audit=info,warn"),
            1 => EnvFilter::new("outlink_audit=debug,info"),
            2 => EnvFilter::new("outlink_audit=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the scan command
async fn handle_scan(mut settings: ScanSettings, args: ScanArgs) -> anyhow::Result<ExitCode> {
    settings.max_sitemap_depth = args.max_sitemap_depth;

    let request = ScanRequest {
        sitemap_url: args.sitemap_url,
        maintain_hostname: args.maintain_hostname,
        specific_urls: args.specific_urls,
        batch: args.batch,
        allowlist_path: args.allowlist,
        additional_urls_file: args.additional_urls_file,
        export_cache: args.export_cache,
    };

    tracing::info!(
        "Starting scan (batch {}, retry limit {}, wait {:?})",
        request.batch,
        settings.retry.limit,
        settings.retry.wait
    );

    let outcome = run_scan(settings, &request).await.context("Scan failed")?;

    tracing::info!(
        "Checked {} pages on {}, {} unexpected URLs",
        outcome.pages_checked,
        outcome.hostname,
        outcome.unexpected.len()
    );
    if let Some(dir) = &outcome.cache_export {
        tracing::info!("Page cache exported to {}", dir.display());
    }

    Ok(ExitCode::SUCCESS)
}

/// Handles the validate-feeds command
async fn handle_validate_feeds(settings: ScanSettings, args: FeedArgs) -> anyhow::Result<ExitCode> {
    let client = build_http_client(settings.user_agent.as_deref())
        .context("Failed to build HTTP client")?;
    // Feeds are fetched once, without retries
    let mut fetcher = PageFetcher::new(client, RetryPolicy::new(0, settings.retry.wait), Vec::new());

    let failures = validate_feeds(&mut fetcher, &args.hostname, &args.feed_config)
        .await
        .context("Feed validation failed")?;

    if failures.is_empty() {
        println!("No issues found.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Invalid feed detected:");
    for failure in &failures {
        println!("{} {}", failure.url, failure.reason);
    }
    Ok(ExitCode::FAILURE)
}

/// Handles the check-output command
async fn handle_check_output(settings: ScanSettings, args: NotifyArgs) -> anyhow::Result<ExitCode> {
    let notifier = args.notifier(settings.user_agent.as_deref())?;

    match check_for_output(&settings.output_dir, &args.run_context(), &notifier).await? {
        OutputCheck::NoArtifact => {
            println!("No artifact detected");
            Ok(ExitCode::SUCCESS)
        }
        OutputCheck::Found { message, .. } => {
            eprintln!("{}", message);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Handles the check-geo command
async fn handle_check_geo(settings: ScanSettings, args: NotifyArgs) -> anyhow::Result<ExitCode> {
    let notifier = args.notifier(settings.user_agent.as_deref())?;
    let action_url = args.run_context().action_url();

    let result = check_geo_consistency(&settings.output_dir.join(PAGE_CACHE_DIR))?;
    let message = match &result {
        GeoConsistency::Consistent { code, pages } => {
            println!(
                "All OK: Only one single geo code seen in CDN pages from cache. Checked {} documents",
                pages
            );
            println!("(Code seen: {})", code);
            return Ok(ExitCode::SUCCESS);
        }
        GeoConsistency::MissingCode { pages_without_code } => {
            println!(
                "Found no geo codes in {} CDN page(s)!",
                pages_without_code
            );
            format!(
                "No data-country-code values found in CDN content. See {}",
                action_url
            )
        }
        GeoConsistency::Inconsistent { codes } => {
            println!("Found {} geo codes in CDN pages: {:?}", codes.len(), codes);
            format!(
                "Inconsistent number of data-country-code values found from CDN content. See {}",
                action_url
            )
        }
    };

    notifier.notify(&message).await?;

    Ok(ExitCode::from(result.exit_code()))
}
