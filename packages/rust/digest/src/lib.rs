//! Digest synthesis: render an analysis into the weekly digest document.
//!
//! The document has a fixed section sequence: Executive Summary, News
//! Highlights, Regulatory Updates, Research & Reports, Market Developments,
//! Implications (per audience), Sources. Narrative sections are generated
//! through the oracle; a failed generation falls back to a deterministic
//! rendering of the same analysis data, so oracle trouble degrades the
//! digest instead of losing the period.

mod sections;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use esgmonitor_analysis::Analysis;
use esgmonitor_oracle::OracleClient;
use esgmonitor_shared::{Digest, MonitorError, Result, period_key};

use sections::{
    AUDIENCE_SECTIONS, EMPTY_PERIOD_BODY, NARRATIVE_SECTIONS, Section, analysis_facts,
    fallback_body,
};

/// A synthesized digest plus how it was produced.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub digest: Digest,
    /// Sections rendered from the deterministic fallback after a failed
    /// generation call.
    pub sections_fallback: usize,
}

/// Synthesize the digest document for one reporting period.
///
/// An empty analysis produces a valid digest with placeholder section
/// bodies and makes no oracle calls.
#[instrument(skip_all, fields(period = %period_key(period_end)))]
pub async fn synthesize(
    client: &OracleClient,
    analysis: &Analysis,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Synthesis {
    let mut content = format!(
        "# ESG in Real Estate Weekly Digest\n## {} - {}\n",
        period_start.format("%B %d"),
        period_end.format("%B %d, %Y"),
    );
    let mut sections_fallback = 0;

    let facts = analysis_facts(analysis);

    for section in NARRATIVE_SECTIONS {
        content.push_str(&format!("\n{}\n\n", section.heading));
        content.push_str(&section_body(client, section, analysis, &facts, &mut sections_fallback).await);
        content.push('\n');
    }

    content.push_str("\n## Implications\n");
    for section in AUDIENCE_SECTIONS {
        content.push_str(&format!("\n{}\n\n", section.heading));
        content.push_str(&section_body(client, section, analysis, &facts, &mut sections_fallback).await);
        content.push('\n');
    }

    content.push_str("\n## Sources\n\n");
    content.push_str(&sources_section(analysis));
    content.push('\n');

    info!(sections_fallback, "digest synthesized");

    Synthesis {
        digest: Digest {
            period_end,
            content,
            theme_summary: analysis.theme_summary.clone(),
        },
        sections_fallback,
    }
}

async fn section_body(
    client: &OracleClient,
    section: &Section,
    analysis: &Analysis,
    facts: &str,
    sections_fallback: &mut usize,
) -> String {
    if analysis.is_empty() {
        return EMPTY_PERIOD_BODY.to_string();
    }

    match client.generate(&section.prompt(facts)).await {
        Ok(body) => body.trim().to_string(),
        Err(e) => {
            warn!(section = section.heading, error = %e, "section generation failed");
            *sections_fallback += 1;
            fallback_body(analysis)
        }
    }
}

/// Union of retained item URLs, first-seen order, deduplicated.
fn sources_section(analysis: &Analysis) -> String {
    let mut seen = Vec::new();
    for item in &analysis.items {
        if let Some(url) = &item.url {
            if !seen.iter().any(|s| s == url) {
                seen.push(url.clone());
            }
        }
    }

    if seen.is_empty() {
        return "No sources this period.".to_string();
    }
    seen.iter()
        .map(|url| format!("- {url}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the digest to `<output_dir>/esg_re_digest_<YYYY-MM-DD>.md`.
///
/// The write is atomic: content lands in a temp file first and is renamed
/// into place, so a crash never leaves a half-written digest behind.
pub fn write_digest_file(digest: &Digest, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir).map_err(|e| MonitorError::io(output_dir, e))?;

    let file_name = format!("esg_re_digest_{}.md", digest.period_key());
    let final_path = output_dir.join(&file_name);
    let tmp_path = output_dir.join(format!(".{file_name}.tmp"));

    std::fs::write(&tmp_path, &digest.content).map_err(|e| MonitorError::io(&tmp_path, e))?;
    std::fs::rename(&tmp_path, &final_path).map_err(|e| MonitorError::io(&final_path, e))?;

    info!(path = %final_path.display(), "digest written");
    Ok(final_path)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use esgmonitor_oracle::ScriptedOracle;
    use esgmonitor_shared::{AnalyzedItem, Geography, Importance, ThemeStat, ThemeSummary};

    use super::*;

    fn item(title: &str, url: Option<&str>) -> AnalyzedItem {
        AnalyzedItem {
            title: title.into(),
            source: "Test Wire".into(),
            url: url.map(String::from),
            summary: format!("{title} summary."),
            theme: "green_finance".into(),
            importance: Importance::High,
            relevance: 0.9,
            geography: Geography::UK,
        }
    }

    fn analysis_with(items: Vec<AnalyzedItem>) -> Analysis {
        let mut theme_summary = ThemeSummary::default();
        if !items.is_empty() {
            theme_summary.0.insert(
                "green_finance".into(),
                ThemeStat {
                    count: items.len() as u32,
                    highlights: items.iter().map(|i| i.summary.clone()).collect(),
                },
            );
        }
        Analysis {
            top_stories: items.clone(),
            items,
            theme_summary,
            excluded_count: 0,
            failed_count: 0,
        }
    }

    fn client(oracle: ScriptedOracle) -> OracleClient {
        OracleClient::new(Arc::new(oracle), Duration::ZERO)
    }

    fn dates() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(),
            NaiveDate::from_ymd_opt(2026, 8, 27).unwrap(),
        )
    }

    const SECTION_COUNT: usize = 8; // five narrative + three audience

    #[tokio::test]
    async fn sections_appear_in_fixed_order() {
        let oracle = ScriptedOracle::new();
        for i in 0..SECTION_COUNT {
            oracle.push_generate(format!("section body {i}"));
        }
        let client = client(oracle);
        let (start, end) = dates();

        let synthesis = synthesize(&client, &analysis_with(vec![item("story", None)]), start, end).await;
        let content = &synthesis.digest.content;

        let order = [
            "# ESG in Real Estate Weekly Digest",
            "## August 20 - August 27, 2026",
            "## Executive Summary",
            "## News Highlights",
            "## Regulatory Updates",
            "## Research & Reports",
            "## Market Developments",
            "## Implications",
            "### For Investors",
            "### For Asset Managers",
            "### For ESG Consultants",
            "## Sources",
        ];
        let mut last = 0;
        for heading in order {
            let pos = content[last..]
                .find(heading)
                .unwrap_or_else(|| panic!("missing or out of order: {heading}"));
            last += pos;
        }
        assert_eq!(synthesis.sections_fallback, 0);
        assert_eq!(synthesis.digest.period_key(), "2026-08-27");
    }

    #[tokio::test]
    async fn failed_generation_falls_back_per_section() {
        let oracle = ScriptedOracle::new();
        oracle.fail_generate("quota");
        for _ in 1..SECTION_COUNT {
            oracle.push_generate("fine");
        }
        let client = client(oracle);
        let (start, end) = dates();

        let synthesis = synthesize(&client, &analysis_with(vec![item("story", None)]), start, end).await;

        assert_eq!(synthesis.sections_fallback, 1);
        assert!(synthesis.digest.content.contains("coverage is"));
        assert!(synthesis.digest.content.contains("**story**"));
    }

    #[tokio::test]
    async fn empty_analysis_makes_no_oracle_calls() {
        let oracle = Arc::new(ScriptedOracle::new());
        let client = OracleClient::new(oracle.clone(), Duration::ZERO);
        let (start, end) = dates();

        let synthesis = synthesize(&client, &Analysis::default(), start, end).await;

        assert_eq!(oracle.generate_call_count(), 0);
        assert!(synthesis.digest.content.contains(EMPTY_PERIOD_BODY));
        assert!(synthesis.digest.content.contains("No sources this period."));
        assert!(synthesis.digest.theme_summary.is_empty());
    }

    #[tokio::test]
    async fn sources_deduplicated_first_seen_order() {
        let oracle = ScriptedOracle::new();
        for _ in 0..SECTION_COUNT {
            oracle.push_generate("body");
        }
        let client = client(oracle);
        let (start, end) = dates();

        let items = vec![
            item("a", Some("https://example.com/1")),
            item("b", Some("https://example.com/2")),
            item("c", Some("https://example.com/1")),
            item("d", None),
        ];
        let synthesis = synthesize(&client, &analysis_with(items), start, end).await;

        let sources = synthesis
            .digest
            .content
            .split("## Sources")
            .nth(1)
            .unwrap()
            .trim()
            .to_string();
        assert_eq!(sources, "- https://example.com/1\n- https://example.com/2");
    }

    #[test]
    fn digest_file_written_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let digest = Digest {
            period_end: NaiveDate::from_ymd_opt(2026, 8, 27).unwrap(),
            content: "# Digest\ncontent".into(),
            theme_summary: ThemeSummary::default(),
        };

        let path = write_digest_file(&digest, dir.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "esg_re_digest_2026-08-27.md"
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Digest\ncontent");

        // No temp file left behind.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
