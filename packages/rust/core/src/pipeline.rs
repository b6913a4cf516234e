//! End-to-end monitoring pipeline: collect → analyze → synthesize → persist.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{Duration, NaiveDate};
use tracing::{info, instrument};

use esgmonitor_analysis::AnalysisOptions;
use esgmonitor_digest::write_digest_file;
use esgmonitor_oracle::OracleClient;
use esgmonitor_shared::{AppConfig, MonitorError, QueryCatalog, Result, ThemeLexicon, period_key};
use esgmonitor_storage::Storage;

/// Configuration for one pipeline run, resolved from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Category → queries table for collection.
    pub catalog: QueryCatalog,
    /// Theme vocabulary for classification.
    pub lexicon: ThemeLexicon,
    /// Analyzer tunables.
    pub options: AnalysisOptions,
    /// Lookback window in days.
    pub lookback_days: u32,
    /// Directory for the digest markdown artifact.
    pub output_dir: PathBuf,
}

impl RunConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            catalog: config.catalog.clone(),
            lexicon: config.themes.clone(),
            options: AnalysisOptions {
                relevance_threshold: config.defaults.relevance_threshold,
                max_items_per_category: config.defaults.max_items_per_category,
                top_stories_cap: config.defaults.top_stories_cap,
            },
            lookback_days: config.defaults.lookback_days,
            output_dir: PathBuf::from(&config.defaults.output_dir),
        }
    }
}

/// Terminal status of a completed run. A run that returns `Err` is the
/// failed case; it persists nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every query and every section generation succeeded.
    Success,
    /// The run completed and persisted, but some queries failed or some
    /// sections fell back to deterministic rendering.
    Partial,
}

/// Summary of one completed pipeline run.
#[derive(Debug)]
pub struct RunReport {
    pub status: RunStatus,
    pub period_end: NaiveDate,
    /// Path of the written digest file.
    pub digest_path: PathBuf,
    pub items_retained: usize,
    pub items_excluded: usize,
    pub queries_failed: usize,
    /// Raw results dropped because their classify-and-score call failed
    /// or its reply was unparseable.
    pub classifications_failed: usize,
    pub sections_fallback: usize,
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _report: &RunReport) {}
}

/// Run the full pipeline for one reporting period.
///
/// Per-query oracle failures and per-section generation failures degrade
/// the run to `Partial`; only persistence errors and empty synthesis are
/// fatal. On a fatal error nothing is persisted for the period.
#[instrument(skip_all, fields(period = %period_key(period_end)))]
pub async fn run_period(
    config: &RunConfig,
    client: &OracleClient,
    storage: &Storage,
    period_end: NaiveDate,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let start = Instant::now();
    let period_start = period_end - Duration::days(i64::from(config.lookback_days));

    info!(
        period_start = %period_key(period_start),
        queries = config.catalog.query_count(),
        "starting monitoring run"
    );

    // --- Phase 1: Collect ---
    progress.phase("Collecting");
    let raw = esgmonitor_collector::collect(&config.catalog, client, config.lookback_days).await;
    let queries_failed = raw.iter().filter(|r| r.error.is_some()).count();

    // --- Phase 2: Analyze ---
    progress.phase("Analyzing");
    let analysis =
        esgmonitor_analysis::analyze(client, &raw, &config.lexicon, &config.options).await;

    // --- Phase 3: Synthesize ---
    progress.phase("Synthesizing");
    let synthesis =
        esgmonitor_digest::synthesize(client, &analysis, period_start, period_end).await;
    if synthesis.digest.content.trim().is_empty() {
        return Err(MonitorError::validation("synthesis produced no content"));
    }

    // --- Phase 4: Persist ---
    // Artifact first: if the digest file cannot be written the run fails
    // with nothing recorded for the period. The store is the authoritative
    // copy and is only updated once the artifact exists.
    progress.phase("Persisting");
    let digest_path = write_digest_file(&synthesis.digest, &config.output_dir)?;
    storage.upsert_digest(&synthesis.digest).await?;
    storage.replace_items(period_end, &analysis.items).await?;
    storage
        .upsert_theme_trends(period_end, &analysis.theme_summary)
        .await?;

    let status = if queries_failed > 0
        || analysis.failed_count > 0
        || synthesis.sections_fallback > 0
    {
        RunStatus::Partial
    } else {
        RunStatus::Success
    };

    let report = RunReport {
        status,
        period_end,
        digest_path,
        items_retained: analysis.items.len(),
        items_excluded: analysis.excluded_count,
        queries_failed,
        classifications_failed: analysis.failed_count,
        sections_fallback: synthesis.sections_fallback,
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    info!(
        status = ?report.status,
        items_retained = report.items_retained,
        items_excluded = report.items_excluded,
        queries_failed = report.queries_failed,
        classifications_failed = report.classifications_failed,
        elapsed_ms = report.elapsed.as_millis(),
        "monitoring run complete"
    );

    Ok(report)
}
