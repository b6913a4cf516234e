//! Pacing wrapper around a [`ContentOracle`].
//!
//! The provider enforces strict request quotas, so the client spaces calls
//! out rather than retrying on failure: a fixed minimum delay is applied
//! between consecutive calls, whether the previous call succeeded or not.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use esgmonitor_shared::{Query, RawResult, Result};

use crate::traits::ContentOracle;

pub struct OracleClient {
    oracle: Arc<dyn ContentOracle>,
    delay: Duration,
    /// Completion time of the most recent call. Held across the sleep so
    /// concurrent callers are serialized through the same pacing gate.
    last_call: Mutex<Option<Instant>>,
}

impl OracleClient {
    pub fn new(oracle: Arc<dyn ContentOracle>, delay: Duration) -> Self {
        Self {
            oracle,
            delay,
            last_call: Mutex::new(None),
        }
    }

    /// Wait out the remainder of the inter-call delay, then mark this call.
    /// The guard is returned so the caller's oracle call stays inside the
    /// gate; pacing counts from call start, matching a fixed-interval quota.
    async fn pace(&self) -> tokio::sync::MutexGuard<'_, Option<Instant>> {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.delay {
                let wait = self.delay - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "pacing oracle call");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
        last
    }

    /// Paced search. Propagates failures.
    pub async fn search(&self, query: &str, lookback_days: u32) -> Result<String> {
        let _gate = self.pace().await;
        self.oracle.search(query, lookback_days).await
    }

    /// Paced generation. Propagates failures.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let _gate = self.pace().await;
        self.oracle.generate(prompt).await
    }

    /// Run one catalog query and fold the outcome into a [`RawResult`].
    /// A failed call yields a result with empty text and an error marker —
    /// one bad query must never abort a collection run.
    pub async fn invoke(&self, query: &Query, lookback_days: u32) -> RawResult {
        let outcome = self.search(&query.text, lookback_days).await;

        let (raw_text, error) = match outcome {
            Ok(text) => (text, None),
            Err(e) => {
                warn!(query = %query.text, error = %e, "oracle query failed");
                (String::new(), Some(e.to_string()))
            }
        };

        RawResult {
            category: query.category.clone(),
            query: query.text.clone(),
            title: None,
            source: None,
            url: None,
            raw_text,
            fetched_at: Utc::now(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedOracle;

    #[tokio::test]
    async fn invoke_folds_failure_into_result() {
        let oracle = ScriptedOracle::new();
        oracle.fail_search("bad query", "quota exhausted");
        let client = OracleClient::new(Arc::new(oracle), Duration::ZERO);

        let result = client
            .invoke(&Query::new("news", "bad query"), 7)
            .await;
        assert_eq!(result.category, "news");
        assert!(result.raw_text.is_empty());
        assert!(result.error.as_deref().unwrap().contains("quota exhausted"));
        assert!(!result.has_content());
    }

    #[tokio::test]
    async fn invoke_carries_search_text() {
        let oracle = ScriptedOracle::new();
        oracle.script_search("good query", "three stories about retrofits");
        let client = OracleClient::new(Arc::new(oracle), Duration::ZERO);

        let result = client
            .invoke(&Query::new("news", "good query"), 7)
            .await;
        assert_eq!(result.raw_text, "three stories about retrofits");
        assert!(result.error.is_none());
        assert!(result.has_content());
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_calls_are_paced() {
        let oracle = ScriptedOracle::new();
        oracle.script_search("q1", "a");
        oracle.script_search("q2", "b");
        let client = OracleClient::new(Arc::new(oracle), Duration::from_secs(60));

        let start = Instant::now();
        client.invoke(&Query::new("news", "q1"), 7).await;
        // First call goes through immediately.
        assert!(start.elapsed() < Duration::from_secs(1));

        client.invoke(&Query::new("news", "q2"), 7).await;
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_still_counts_for_pacing() {
        let oracle = ScriptedOracle::new();
        oracle.fail_search("q1", "boom");
        oracle.script_search("q2", "ok");
        let client = OracleClient::new(Arc::new(oracle), Duration::from_secs(60));

        let start = Instant::now();
        client.invoke(&Query::new("news", "q1"), 7).await;
        client.invoke(&Query::new("news", "q2"), 7).await;
        assert!(start.elapsed() >= Duration::from_secs(60));
    }
}
