//! Classification prompt construction.

use esgmonitor_shared::{RawResult, ThemeLexicon};

/// Build the classify-and-score instruction for one raw search result.
pub(crate) fn classification_prompt(raw: &RawResult, lexicon: &ThemeLexicon) -> String {
    let themes = lexicon.keys().join(", ");

    format!(
        "Analyze the following search findings about ESG in real estate \
         (category: {category}, query: \"{query}\").\n\n\
         For each distinct story in the findings, determine:\n\
         1. A relevance score (0 to 1) for ESG in real estate\n\
         2. The primary theme, exactly one of: {themes}\n\
         3. A key insight or takeaway (1-2 sentences)\n\
         4. An importance level (high, medium, low)\n\
         5. The geographic scope (UK, EU, US, Global, Other)\n\n\
         Findings:\n{raw_text}\n\n\
         Reply with only a JSON array, one object per story, with keys: \
         title, source, url, summary, theme, importance, relevance, geography. \
         Use null for an unknown url. Return [] if the findings contain no \
         distinct stories.",
        category = raw.category,
        query = raw.query,
        raw_text = raw.raw_text,
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn prompt_names_every_configured_theme() {
        let raw = RawResult {
            category: "news".into(),
            query: "green bonds".into(),
            title: None,
            source: None,
            url: None,
            raw_text: "Three new issuances this week.".into(),
            fetched_at: Utc::now(),
            error: None,
        };
        let lexicon = ThemeLexicon::default();
        let prompt = classification_prompt(&raw, &lexicon);

        for key in lexicon.keys() {
            assert!(prompt.contains(key), "missing theme {key}");
        }
        assert!(prompt.contains("Three new issuances"));
        assert!(prompt.contains("green bonds"));
    }
}
