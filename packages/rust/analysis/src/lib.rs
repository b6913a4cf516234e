//! Analysis phase: classify, score, and filter collected content.
//!
//! Each raw search result is sent back through the oracle with a
//! classify-and-score instruction; the JSON reply is parsed leniently and
//! every resulting item is forced into the configured theme vocabulary
//! before filtering and ranking. Oracle failures and malformed replies
//! drop the affected result and are counted, never propagated.

mod parse;
mod prompt;

use regex::RegexBuilder;
use tracing::{debug, instrument, warn};

use esgmonitor_oracle::OracleClient;
use esgmonitor_shared::{AnalyzedItem, RawResult, ThemeLexicon, ThemeStat, ThemeSummary};

use parse::parse_reply;
use prompt::classification_prompt;

/// Tunables for one analysis pass, taken from `[defaults]` config.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Items scoring below this are excluded from all outputs.
    pub relevance_threshold: f64,
    /// Highlight summaries kept per theme.
    pub max_items_per_category: usize,
    /// Entries in the top-stories ranking.
    pub top_stories_cap: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.6,
            max_items_per_category: 5,
            top_stories_cap: 5,
        }
    }
}

/// Output of one analysis pass.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// Retained items, in discovery order.
    pub items: Vec<AnalyzedItem>,
    /// Most important retained items, capped.
    pub top_stories: Vec<AnalyzedItem>,
    /// Per-theme counts and highlights over retained items.
    pub theme_summary: ThemeSummary,
    /// Items excluded by the relevance threshold.
    pub excluded_count: usize,
    /// Raw results whose classification call or reply parse failed.
    pub failed_count: usize,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Classify and score raw results against the theme lexicon.
///
/// Results without content (failed queries) are skipped here; the collector
/// already recorded their failure.
#[instrument(skip_all, fields(raw = raw.len()))]
pub async fn analyze(
    client: &OracleClient,
    raw: &[RawResult],
    lexicon: &ThemeLexicon,
    options: &AnalysisOptions,
) -> Analysis {
    let mut retained = Vec::new();
    let mut excluded_count = 0;
    let mut failed_count = 0;

    for result in raw.iter().filter(|r| r.has_content()) {
        let prompt = classification_prompt(result, lexicon);

        let reply = match client.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(query = %result.query, error = %e, "classification call failed");
                failed_count += 1;
                continue;
            }
        };

        let wires = match parse_reply(&reply) {
            Ok(wires) => wires,
            Err(e) => {
                warn!(query = %result.query, error = %e, "classification reply unparseable");
                failed_count += 1;
                continue;
            }
        };

        for wire in wires {
            let mut item = wire.into_item();
            item.theme = resolve_theme(&item.theme, &item.title, &item.summary, lexicon);

            if item.relevance < options.relevance_threshold {
                debug!(title = %item.title, relevance = item.relevance, "below threshold");
                excluded_count += 1;
                continue;
            }
            retained.push(item);
        }
    }

    let top_stories = top_stories(&retained, options.top_stories_cap);
    let theme_summary = summarize_themes(&retained, options.max_items_per_category);

    Analysis {
        items: retained,
        top_stories,
        theme_summary,
        excluded_count,
        failed_count,
    }
}

/// Force a theme into the configured vocabulary. An in-set theme passes
/// through; otherwise the item's title and summary are scanned against the
/// lexicon keywords (word-boundary, case-insensitive), first hit in
/// declaration order wins; no hit means the fallback theme.
pub fn resolve_theme(theme: &str, title: &str, summary: &str, lexicon: &ThemeLexicon) -> String {
    if lexicon.contains(theme) {
        return theme.to_string();
    }

    let haystack = format!("{title} {summary}");
    for entry in &lexicon.entries {
        for keyword in &entry.keywords {
            let pattern = format!(r"\b{}\b", regex::escape(keyword));
            let matched = RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .map(|re| re.is_match(&haystack))
                .unwrap_or(false);
            if matched {
                return entry.key.clone();
            }
        }
    }

    lexicon.fallback().to_string()
}

/// Rank retained items by (importance desc, relevance desc); the sort is
/// stable, so discovery order breaks remaining ties.
fn top_stories(items: &[AnalyzedItem], cap: usize) -> Vec<AnalyzedItem> {
    let mut ranked: Vec<AnalyzedItem> = items.to_vec();
    ranked.sort_by(|a, b| {
        b.importance
            .cmp(&a.importance)
            .then_with(|| b.relevance.total_cmp(&a.relevance))
    });
    ranked.truncate(cap);
    ranked
}

/// Count retained items per theme and keep the strongest summaries as
/// highlights, ordered by relevance descending.
fn summarize_themes(items: &[AnalyzedItem], max_highlights: usize) -> ThemeSummary {
    let mut summary = ThemeSummary::default();

    for item in items {
        let stat = summary.0.entry(item.theme.clone()).or_insert_with(ThemeStat::default);
        stat.count += 1;
    }

    for (theme, stat) in summary.0.iter_mut() {
        let mut themed: Vec<&AnalyzedItem> =
            items.iter().filter(|i| &i.theme == theme).collect();
        themed.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        stat.highlights = themed
            .iter()
            .take(max_highlights)
            .map(|i| i.summary.clone())
            .collect();
    }

    summary
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use esgmonitor_oracle::ScriptedOracle;
    use esgmonitor_shared::Importance;

    use super::*;

    fn raw(query: &str, text: &str) -> RawResult {
        RawResult {
            category: "news".into(),
            query: query.into(),
            title: None,
            source: None,
            url: None,
            raw_text: text.into(),
            fetched_at: Utc::now(),
            error: None,
        }
    }

    fn entry(title: &str, theme: &str, importance: &str, relevance: f64) -> serde_json::Value {
        serde_json::json!({
            "title": title,
            "source": "Test Wire",
            "url": format!("https://example.com/{}", title.replace(' ', "-")),
            "summary": format!("{title} in brief."),
            "theme": theme,
            "importance": importance,
            "relevance": relevance,
            "geography": "UK"
        })
    }

    fn client(oracle: ScriptedOracle) -> OracleClient {
        OracleClient::new(Arc::new(oracle), Duration::ZERO)
    }

    #[tokio::test]
    async fn threshold_excludes_but_counts() {
        let oracle = ScriptedOracle::new();
        oracle.push_generate(
            serde_json::json!([
                entry("kept story", "carbon_emissions", "high", 0.8),
                entry("weak story", "carbon_emissions", "high", 0.3),
            ])
            .to_string(),
        );
        let client = client(oracle);

        let analysis = analyze(
            &client,
            &[raw("q", "findings")],
            &ThemeLexicon::default(),
            &AnalysisOptions::default(),
        )
        .await;

        assert_eq!(analysis.items.len(), 1);
        assert_eq!(analysis.items[0].title, "kept story");
        assert_eq!(analysis.excluded_count, 1);
        assert_eq!(analysis.theme_summary.total_mentions(), 1);
    }

    #[tokio::test]
    async fn unknown_theme_resolves_by_keyword_then_fallback() {
        let oracle = ScriptedOracle::new();
        oracle.push_generate(
            serde_json::json!([
                {
                    "title": "Office retrofit wave",
                    "source": "s",
                    "url": null,
                    "summary": "A surge of energy efficiency retrofit projects.",
                    "theme": "buildings_misc",
                    "importance": "medium",
                    "relevance": 0.9,
                    "geography": "EU"
                },
                {
                    "title": "Sector roundup",
                    "source": "s",
                    "url": null,
                    "summary": "General commentary with no signal words.",
                    "theme": "buildings_misc",
                    "importance": "low",
                    "relevance": 0.7,
                    "geography": "Global"
                }
            ])
            .to_string(),
        );
        let client = client(oracle);
        let lexicon = ThemeLexicon::default();

        let analysis = analyze(
            &client,
            &[raw("q", "findings")],
            &lexicon,
            &AnalysisOptions::default(),
        )
        .await;

        assert_eq!(analysis.items[0].theme, "energy_efficiency");
        assert_eq!(analysis.items[1].theme, lexicon.fallback());
    }

    #[tokio::test]
    async fn top_stories_stable_order_and_cap() {
        let oracle = ScriptedOracle::new();
        oracle.push_generate(
            serde_json::json!([
                entry("medium early", "green_finance", "medium", 0.9),
                entry("high a", "green_finance", "high", 0.7),
                entry("high b", "green_finance", "high", 0.7),
                entry("high strong", "green_finance", "high", 0.95),
            ])
            .to_string(),
        );
        let client = client(oracle);

        let options = AnalysisOptions {
            top_stories_cap: 3,
            ..AnalysisOptions::default()
        };
        let analysis = analyze(
            &client,
            &[raw("q", "findings")],
            &ThemeLexicon::default(),
            &options,
        )
        .await;

        let titles: Vec<&str> = analysis.top_stories.iter().map(|i| i.title.as_str()).collect();
        // Importance first, then relevance, then discovery order for the tie.
        assert_eq!(titles, vec!["high strong", "high a", "high b"]);
        assert_eq!(analysis.top_stories[0].importance, Importance::High);
    }

    #[tokio::test]
    async fn highlights_capped_and_relevance_ordered() {
        let oracle = ScriptedOracle::new();
        oracle.push_generate(
            serde_json::json!([
                entry("one", "climate_risk", "low", 0.65),
                entry("two", "climate_risk", "low", 0.95),
                entry("three", "climate_risk", "low", 0.8),
            ])
            .to_string(),
        );
        let client = client(oracle);

        let options = AnalysisOptions {
            max_items_per_category: 2,
            ..AnalysisOptions::default()
        };
        let analysis = analyze(
            &client,
            &[raw("q", "findings")],
            &ThemeLexicon::default(),
            &options,
        )
        .await;

        let stat = &analysis.theme_summary.0["climate_risk"];
        assert_eq!(stat.count, 3);
        assert_eq!(stat.highlights, vec!["two in brief.", "three in brief."]);
    }

    #[tokio::test]
    async fn malformed_reply_drops_and_counts() {
        let oracle = ScriptedOracle::new();
        oracle.push_generate("I could not classify anything, sorry.");
        oracle.push_generate(serde_json::json!([entry("ok", "green_finance", "high", 0.9)]).to_string());
        let client = client(oracle);

        let analysis = analyze(
            &client,
            &[raw("q1", "first"), raw("q2", "second")],
            &ThemeLexicon::default(),
            &AnalysisOptions::default(),
        )
        .await;

        assert_eq!(analysis.failed_count, 1);
        assert_eq!(analysis.items.len(), 1);
        assert_eq!(analysis.items[0].title, "ok");
    }

    #[tokio::test]
    async fn failed_queries_are_skipped_without_oracle_calls() {
        let oracle = ScriptedOracle::new();
        let client = client(oracle);

        let failed = RawResult {
            raw_text: String::new(),
            error: Some("timeout".into()),
            ..raw("q", "")
        };
        let analysis = analyze(
            &client,
            &[failed],
            &ThemeLexicon::default(),
            &AnalysisOptions::default(),
        )
        .await;

        assert!(analysis.is_empty());
        assert_eq!(analysis.failed_count, 0);
        assert!(analysis.theme_summary.is_empty());
    }

    #[test]
    fn resolve_theme_passes_known_theme_through() {
        let lexicon = ThemeLexicon::default();
        assert_eq!(
            resolve_theme("proptech_innovation", "t", "s", &lexicon),
            "proptech_innovation"
        );
    }

    #[test]
    fn resolve_theme_is_case_insensitive_on_keywords() {
        let lexicon = ThemeLexicon::default();
        assert_eq!(
            resolve_theme("unknown", "BREEAM Outstanding awarded", "", &lexicon),
            "certification_ratings"
        );
        // Word boundary: "carbonated" must not match "carbon".
        assert_eq!(
            resolve_theme("unknown", "Carbonated drinks maker", "opens plant", &lexicon),
            lexicon.fallback()
        );
    }
}
