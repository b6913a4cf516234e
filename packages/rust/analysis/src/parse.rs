//! Parsing of classification replies.
//!
//! The oracle is asked for a bare JSON array, but replies routinely arrive
//! wrapped in markdown code fences or preceded by a sentence of preamble.
//! Extraction is therefore lenient: strip fences, then take the outermost
//! `[..]` span.

use serde::Deserialize;

use esgmonitor_shared::{AnalyzedItem, Geography, Importance, MonitorError, Result};

/// One classified entry as the oracle reports it, before label mapping.
#[derive(Debug, Deserialize)]
pub(crate) struct ClassifiedWire {
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
    pub summary: String,
    pub theme: String,
    #[serde(default)]
    pub importance: String,
    pub relevance: f64,
    #[serde(default)]
    pub geography: String,
}

impl ClassifiedWire {
    /// Map free-form labels onto domain types. The theme is passed through
    /// as-is; restriction to the configured set happens in the analyzer.
    pub fn into_item(self) -> AnalyzedItem {
        AnalyzedItem {
            title: self.title,
            source: self.source,
            url: self.url,
            summary: self.summary,
            theme: self.theme,
            importance: Importance::from_label(&self.importance),
            relevance: self.relevance.clamp(0.0, 1.0),
            geography: Geography::from_label(&self.geography),
        }
    }
}

/// Extract the JSON array from a possibly fenced, possibly chatty reply.
pub(crate) fn extract_json_array(reply: &str) -> Result<&str> {
    let trimmed = reply.trim();

    // Strip a ```json ... ``` fence if present.
    let body = if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        rest.rsplit_once("```").map(|(inner, _)| inner).unwrap_or(rest)
    } else {
        trimmed
    };

    let start = body
        .find('[')
        .ok_or_else(|| MonitorError::parse("no JSON array in reply"))?;
    let end = body
        .rfind(']')
        .ok_or_else(|| MonitorError::parse("unterminated JSON array in reply"))?;
    if end < start {
        return Err(MonitorError::parse("malformed JSON array in reply"));
    }
    Ok(&body[start..=end])
}

/// Parse a classification reply into wire entries.
pub(crate) fn parse_reply(reply: &str) -> Result<Vec<ClassifiedWire>> {
    let json = extract_json_array(reply)?;
    serde_json::from_str(json)
        .map_err(|e| MonitorError::parse(format!("invalid classification JSON: {e}")))
}
