//! Anthropic Messages API implementation of [`ContentOracle`].

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;

use esgmonitor_shared::{MonitorError, OracleConfig, Result};

use crate::traits::ContentOracle;
use crate::wire::{ChatRequest, ChatResponse, ToolDefinitionWire, WireMessage};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicOracle {
    api_key: String,
    model: String,
    max_tokens: u32,
    http: reqwest::Client,
    base_url: String,
}

impl AnthropicOracle {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
            http: reqwest::Client::new(),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    /// Build from config, reading the API key from the configured env var.
    pub fn from_config(config: &OracleConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            MonitorError::config(format!("{} environment variable not set", config.api_key_env))
        })?;
        Ok(Self::new(api_key, &config.model, config.max_tokens))
    }

    /// Override the API base URL (tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| MonitorError::config(format!("invalid API key: {e}")))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/messages", self.base_url);

        debug!(model = %request.model, "oracle request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| MonitorError::Oracle(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(MonitorError::Oracle(format!(
                "API error ({status}): {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MonitorError::Oracle(format!("invalid response body: {e}")))
    }
}

#[async_trait]
impl ContentOracle for AnthropicOracle {
    async fn search(&self, query: &str, lookback_days: u32) -> Result<String> {
        let prompt = format!(
            "Search for: {query}\n\n\
             Restrict results to items published in the last {lookback_days} days. \
             For each relevant finding provide the title, source, URL, and a \
             one-paragraph summary of the key insight."
        );

        let request = ChatRequest::new(&self.model, self.max_tokens)
            .message(WireMessage::user(prompt))
            .tool(ToolDefinitionWire::web_search());

        let response = self.chat(&request).await?;
        let text = response.text();
        if text.is_empty() {
            return Err(MonitorError::Oracle("empty search response".into()));
        }
        Ok(text)
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request =
            ChatRequest::new(&self.model, self.max_tokens).message(WireMessage::user(prompt));

        let response = self.chat(&request).await?;
        let text = response.text();
        if text.is_empty() {
            return Err(MonitorError::Oracle("empty generate response".into()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn text_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn"
        })
    }

    #[tokio::test]
    async fn generate_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("a digest")))
            .expect(1)
            .mount(&server)
            .await;

        let oracle = AnthropicOracle::new("sk-test", "claude-sonnet-4-20250514", 4096)
            .with_base_url(server.uri());
        let text = oracle.generate("write something").await.unwrap();
        assert_eq!(text, "a digest");
    }

    #[tokio::test]
    async fn search_sends_web_search_tool() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(wiremock::matchers::body_partial_json(serde_json::json!({
                "tools": [{"type": "web_search_20250305", "name": "web_search"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("findings")))
            .expect(1)
            .mount(&server)
            .await;

        let oracle = AnthropicOracle::new("sk-test", "claude-sonnet-4-20250514", 4096)
            .with_base_url(server.uri());
        let text = oracle.search("ESG real estate news", 7).await.unwrap();
        assert_eq!(text, "findings");
    }

    #[tokio::test]
    async fn non_success_status_is_oracle_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let oracle = AnthropicOracle::new("sk-test", "claude-sonnet-4-20250514", 4096)
            .with_base_url(server.uri());
        let err = oracle.generate("prompt").await.unwrap_err();
        assert!(matches!(err, MonitorError::Oracle(_)));
        assert!(err.to_string().contains("429"));
    }
}
