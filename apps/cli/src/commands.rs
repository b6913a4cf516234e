//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use esgmonitor_core::{ProgressReporter, RunConfig, RunReport, RunStatus, run_period};
use esgmonitor_oracle::{AnthropicOracle, OracleClient};
use esgmonitor_shared::{
    PERIOD_DATE_FORMAT, config_file_path, init_config, load_config, period_key, validate_api_key,
};
use esgmonitor_storage::Storage;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ESG monitor — periodic ESG-in-real-estate digests and theme trends.
#[derive(Parser)]
#[command(
    name = "esgmonitor",
    version,
    about = "Collect, classify, and digest ESG real estate developments.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the monitoring pipeline for one reporting period.
    Run {
        /// Lookback window in days (defaults to the configured value).
        #[arg(long)]
        days: Option<u32>,

        /// Period end date, YYYY-MM-DD (defaults to today).
        #[arg(long)]
        end: Option<String>,
    },

    /// Show recent digests from the store.
    Recent {
        /// Number of digests to show.
        #[arg(short = 'n', long, default_value = "5")]
        limit: u32,

        /// Print the full digest content instead of a summary.
        #[arg(long)]
        full: bool,
    },

    /// Show theme mention trends over a rolling window.
    Trends {
        /// Window size in weeks.
        #[arg(long, default_value = "12")]
        weeks: u32,

        /// Restrict to a single theme.
        #[arg(long)]
        theme: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "esgmonitor=info",
        1 => "esgmonitor=debug",
        _ => "esgmonitor=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run { days, end } => cmd_run(days, end.as_deref()).await,
        Command::Recent { limit, full } => cmd_recent(limit, full).await,
        Command::Trends { weeks, theme } => cmd_trends(weeks, theme.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn cmd_run(days: Option<u32>, end: Option<&str>) -> Result<()> {
    // Validate the credential before doing anything
    let config = load_config()?;
    validate_api_key(&config)?;

    let period_end = match end {
        Some(s) => NaiveDate::parse_from_str(s, PERIOD_DATE_FORMAT)
            .map_err(|e| eyre!("invalid --end date '{s}': {e}"))?,
        None => Utc::now().date_naive(),
    };

    let mut run_config = RunConfig::from_app_config(&config);
    if let Some(days) = days {
        run_config.lookback_days = days;
    }

    let oracle = AnthropicOracle::from_config(&config.oracle)?;
    let client = OracleClient::new(
        Arc::new(oracle),
        Duration::from_millis(config.oracle.call_delay_ms),
    );
    let storage = Storage::open(&PathBuf::from(&config.defaults.database_path)).await?;

    info!(
        period_end = %period_key(period_end),
        lookback_days = run_config.lookback_days,
        "starting monitoring run"
    );

    let reporter = CliProgress::new();
    let report = run_period(&run_config, &client, &storage, period_end, &reporter).await?;

    // Print summary
    println!();
    println!("  Monitoring run complete!");
    println!("  Status:   {}", status_label(report.status));
    println!("  Period:   {}", period_key(report.period_end));
    println!("  Retained: {} items", report.items_retained);
    println!("  Excluded: {} below threshold", report.items_excluded);
    if report.queries_failed > 0 {
        println!("  Failed:   {} queries", report.queries_failed);
    }
    if report.classifications_failed > 0 {
        println!("  Dropped:  {} results unclassified", report.classifications_failed);
    }
    println!("  Digest:   {}", report.digest_path.display());
    println!("  Time:     {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Success => "success",
        RunStatus::Partial => "partial (reduced coverage)",
    }
}

async fn cmd_recent(limit: u32, full: bool) -> Result<()> {
    let config = load_config()?;
    let storage = Storage::open(&PathBuf::from(&config.defaults.database_path)).await?;

    let digests = storage.recent_digests(limit).await?;
    if digests.is_empty() {
        println!("No digests stored yet. Run `esgmonitor run` first.");
        return Ok(());
    }

    for digest in digests {
        if full {
            println!("{}", digest.content);
            println!("---");
        } else {
            let themes: Vec<String> = digest
                .theme_summary
                .0
                .iter()
                .map(|(theme, stat)| format!("{theme}: {}", stat.count))
                .collect();
            println!("  {}", digest.period_key());
            println!(
                "    {} mentions across {} themes ({})",
                digest.theme_summary.total_mentions(),
                digest.theme_summary.0.len(),
                themes.join(", ")
            );
        }
    }
    Ok(())
}

async fn cmd_trends(weeks: u32, theme: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let storage = Storage::open(&PathBuf::from(&config.defaults.database_path)).await?;

    let trends = storage.theme_trends(weeks, theme).await?;
    if trends.is_empty() {
        println!("No trend data in the last {weeks} weeks.");
        return Ok(());
    }

    for (theme, points) in trends {
        println!("  {theme}");
        for point in points {
            println!(
                "    {}  {:>3} mentions",
                period_key(point.period_end),
                point.mention_count
            );
        }
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config written to {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let path = config_file_path()?;
    println!("# {}", path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}
