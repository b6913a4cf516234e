//! Section templates for the weekly digest.
//!
//! The section sequence is fixed; each narrative section gets its own
//! instruction template and is generated from the analysis facts alone.
//! The Implications subsections use per-audience templates.

use esgmonitor_analysis::Analysis;

/// Narrative sections, in document order. Sources is rendered
/// deterministically and is not listed here.
pub(crate) const NARRATIVE_SECTIONS: &[Section] = &[
    Section {
        heading: "## Executive Summary",
        instruction: "Write an executive summary (about 150 words) of the week's \
                      top 3-5 ESG real estate developments and the key theme of \
                      the week.",
    },
    Section {
        heading: "## News Highlights",
        instruction: "Summarize the major announcements, market movements, and \
                      company initiatives (about 400 words).",
    },
    Section {
        heading: "## Regulatory Updates",
        instruction: "Summarize new or proposed regulations, compliance deadlines, \
                      and official guidance (about 300 words).",
    },
    Section {
        heading: "## Research & Reports",
        instruction: "Summarize new studies, data releases, and benchmark updates \
                      (about 300 words).",
    },
    Section {
        heading: "## Market Developments",
        instruction: "Summarize green finance deals, notable transactions, and \
                      PropTech developments (about 300 words).",
    },
];

/// Audience subsections under Implications, in document order.
pub(crate) const AUDIENCE_SECTIONS: &[Section] = &[
    Section {
        heading: "### For Investors",
        instruction: "What are the implications for real estate investors? \
                      Consider risk assessment, valuation impacts, due diligence \
                      requirements, portfolio strategy, regulatory compliance \
                      costs, and green premium opportunities.",
    },
    Section {
        heading: "### For Asset Managers",
        instruction: "What are the implications for asset and property managers? \
                      Consider operational changes, capex requirements, tenant \
                      engagement, certification pathways, reporting obligations, \
                      and technology adoption.",
    },
    Section {
        heading: "### For ESG Consultants",
        instruction: "What are the implications for ESG reporting consultants and \
                      their clients? Consider new reporting requirements, data \
                      collection needs, framework updates, advisory opportunities, \
                      and methodology changes.",
    },
];

#[derive(Debug, Clone, Copy)]
pub(crate) struct Section {
    pub heading: &'static str,
    pub instruction: &'static str,
}

impl Section {
    /// Build this section's generation prompt from the analysis facts.
    pub fn prompt(&self, facts: &str) -> String {
        format!(
            "You are writing one section of a weekly ESG-in-real-estate digest.\n\n\
             {instruction}\n\n\
             Use only the information in the analysis below; do not invent \
             stories, figures, or sources. Write professional markdown body \
             text without a heading.\n\n\
             Analysis:\n{facts}",
            instruction = self.instruction,
        )
    }
}

/// Compact, human-readable rendering of the analysis, embedded in every
/// section prompt.
pub(crate) fn analysis_facts(analysis: &Analysis) -> String {
    let top: Vec<serde_json::Value> = analysis
        .top_stories
        .iter()
        .map(|item| {
            serde_json::json!({
                "title": item.title,
                "source": item.source,
                "url": item.url,
                "summary": item.summary,
                "theme": item.theme,
                "importance": item.importance.as_str(),
                "relevance": item.relevance,
                "geography": item.geography.as_str(),
            })
        })
        .collect();

    let items: Vec<serde_json::Value> = analysis
        .items
        .iter()
        .map(|item| {
            serde_json::json!({
                "title": item.title,
                "source": item.source,
                "summary": item.summary,
                "theme": item.theme,
                "importance": item.importance.as_str(),
            })
        })
        .collect();

    serde_json::to_string_pretty(&serde_json::json!({
        "top_stories": top,
        "theme_summary": analysis.theme_summary,
        "all_items": items,
    }))
    .unwrap_or_else(|_| "{}".into())
}

/// Deterministic stand-in for a section whose generation call failed:
/// the same analysis data, rendered directly, with a reduced-coverage note.
pub(crate) fn fallback_body(analysis: &Analysis) -> String {
    let mut body = String::from(
        "_Narrative synthesis was unavailable for this section; coverage is \
         reduced to the retained items below._\n",
    );
    for item in &analysis.top_stories {
        body.push_str(&format!(
            "\n- **{}** ({}) — {}",
            item.title, item.source, item.summary
        ));
    }
    if analysis.top_stories.is_empty() {
        body.push_str("\n- No qualifying items this period.");
    }
    body
}

/// Body used for every section when the analysis retained nothing.
pub(crate) const EMPTY_PERIOD_BODY: &str = "No qualifying items this period.";
