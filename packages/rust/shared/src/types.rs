//! Core domain types for the monitoring pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Date format used as the storage key for a reporting period.
pub const PERIOD_DATE_FORMAT: &str = "%Y-%m-%d";

/// Format a period end date the way the store keys it (`YYYY-MM-DD`).
pub fn period_key(date: NaiveDate) -> String {
    date.format(PERIOD_DATE_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Query / RawResult
// ---------------------------------------------------------------------------

/// A single catalog-declared search query, tagged with its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Catalog category (e.g. `news`, `regulatory`, `research`, `market`).
    pub category: String,
    /// The search query text.
    pub text: String,
}

impl Query {
    pub fn new(category: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            text: text.into(),
        }
    }
}

/// One discovered item before analysis.
///
/// `raw_text` is empty when the oracle call failed; such results are retained
/// for observability but excluded from downstream theme counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawResult {
    pub category: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub raw_text: String,
    pub fetched_at: DateTime<Utc>,
    /// Error marker set when the oracle call for this query failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RawResult {
    /// Whether this result carries usable content.
    pub fn has_content(&self) -> bool {
        self.error.is_none() && !self.raw_text.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// AnalyzedItem
// ---------------------------------------------------------------------------

/// Importance tier assigned during analysis. Ordered: `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Medium,
    High,
}

impl Importance {
    /// Map a free-form oracle label to a tier. Unknown labels become
    /// `Medium` rather than failing the item.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Geographic scope of an analyzed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Geography {
    UK,
    EU,
    US,
    Global,
    Other,
}

impl Geography {
    /// Map a free-form oracle label to a scope. Unknown labels become `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "UK" => Self::UK,
            "EU" => Self::EU,
            "US" | "USA" => Self::US,
            "GLOBAL" => Self::Global,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UK => "UK",
            Self::EU => "EU",
            Self::US => "US",
            Self::Global => "Global",
            Self::Other => "Other",
        }
    }
}

/// A classified, scored item retained by the analyzer.
///
/// Invariant: `theme` is always one of the configured theme keys — the
/// analyzer maps anything else to the lexicon's fallback theme before an
/// item reaches here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedItem {
    pub title: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub summary: String,
    pub theme: String,
    pub importance: Importance,
    /// Relevance score in `[0, 1]`.
    pub relevance: f64,
    pub geography: Geography,
}

// ---------------------------------------------------------------------------
// ThemeSummary
// ---------------------------------------------------------------------------

/// Per-theme counts and highlight summaries for one reporting period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeStat {
    pub count: u32,
    pub highlights: Vec<String>,
}

/// Theme → stats mapping. Recomputed each run, never mutated incrementally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeSummary(pub BTreeMap<String, ThemeStat>);

impl ThemeSummary {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total mentions across all themes.
    pub fn total_mentions(&self) -> u32 {
        self.0.values().map(|s| s.count).sum()
    }
}

// ---------------------------------------------------------------------------
// Digest / trend points
// ---------------------------------------------------------------------------

/// The synthesized digest document for one reporting period.
///
/// Uniquely identified by `period_end`; re-running a period fully replaces
/// the stored row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digest {
    pub period_end: NaiveDate,
    pub content: String,
    pub theme_summary: ThemeSummary,
}

impl Digest {
    /// Storage key for this digest (`YYYY-MM-DD`).
    pub fn period_key(&self) -> String {
        period_key(self.period_end)
    }
}

/// One (period, theme, mention count) record for longitudinal reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeTrendPoint {
    pub period_end: NaiveDate,
    pub theme: String,
    pub mention_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_key_format() {
        let d = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(period_key(d), "2025-06-01");
    }

    #[test]
    fn importance_ordering() {
        assert!(Importance::High > Importance::Medium);
        assert!(Importance::Medium > Importance::Low);
    }

    #[test]
    fn importance_lenient_labels() {
        assert_eq!(Importance::from_label(" HIGH "), Importance::High);
        assert_eq!(Importance::from_label("low"), Importance::Low);
        assert_eq!(Importance::from_label("critical"), Importance::Medium);
    }

    #[test]
    fn geography_lenient_labels() {
        assert_eq!(Geography::from_label("uk"), Geography::UK);
        assert_eq!(Geography::from_label("USA"), Geography::US);
        assert_eq!(Geography::from_label("APAC"), Geography::Other);
    }

    #[test]
    fn raw_result_content_check() {
        let ok = RawResult {
            category: "news".into(),
            query: "X".into(),
            title: None,
            source: None,
            url: None,
            raw_text: "some findings".into(),
            fetched_at: Utc::now(),
            error: None,
        };
        assert!(ok.has_content());

        let failed = RawResult {
            raw_text: String::new(),
            error: Some("timeout".into()),
            ..ok.clone()
        };
        assert!(!failed.has_content());
    }

    #[test]
    fn theme_summary_serializes_as_map() {
        let mut summary = ThemeSummary::default();
        summary.0.insert(
            "carbon_emissions".into(),
            ThemeStat {
                count: 3,
                highlights: vec!["New embodied carbon rules".into()],
            },
        );

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.contains("\"carbon_emissions\""));

        let parsed: ThemeSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
        assert_eq!(parsed.total_mentions(), 3);
    }

    #[test]
    fn digest_period_key() {
        let digest = Digest {
            period_end: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            content: "# Digest".into(),
            theme_summary: ThemeSummary::default(),
        };
        assert_eq!(digest.period_key(), "2025-06-01");
    }
}
