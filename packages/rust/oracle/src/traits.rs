use async_trait::async_trait;

use esgmonitor_shared::Result;

/// The two capabilities the pipeline needs from a content provider:
/// web-backed search and freeform text generation.
///
/// Implementations must be safe to share behind an `Arc` — the pacing
/// wrapper serializes calls, so no internal rate limiting is required.
#[async_trait]
pub trait ContentOracle: Send + Sync {
    /// Search for recent content matching `query`, restricted to roughly
    /// the last `lookback_days` days. Returns the provider's findings as
    /// free text.
    async fn search(&self, query: &str, lookback_days: u32) -> Result<String>;

    /// Generate text from a prompt, without search.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
