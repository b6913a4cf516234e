//! Deterministic in-memory [`ContentOracle`] for tests and dry runs.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use esgmonitor_shared::{MonitorError, Result};

use crate::traits::ContentOracle;

/// Record of one call made against the scripted oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleCall {
    Search { query: String, lookback_days: u32 },
    Generate { prompt: String },
}

/// A scriptable oracle: search responses are keyed by query text, generate
/// responses are consumed FIFO. Unscripted calls fail, which doubles as
/// failure injection for the paths that must tolerate oracle errors.
#[derive(Default)]
pub struct ScriptedOracle {
    searches: Mutex<HashMap<String, std::result::Result<String, String>>>,
    generates: Mutex<VecDeque<std::result::Result<String, String>>>,
    calls: Mutex<Vec<OracleCall>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful search response for `query`.
    pub fn script_search(&self, query: impl Into<String>, response: impl Into<String>) {
        self.searches
            .lock()
            .unwrap()
            .insert(query.into(), Ok(response.into()));
    }

    /// Script a failing search for `query`.
    pub fn fail_search(&self, query: impl Into<String>, error: impl Into<String>) {
        self.searches
            .lock()
            .unwrap()
            .insert(query.into(), Err(error.into()));
    }

    /// Queue the next successful generate response.
    pub fn push_generate(&self, response: impl Into<String>) {
        self.generates.lock().unwrap().push_back(Ok(response.into()));
    }

    /// Queue a failing generate call.
    pub fn fail_generate(&self, error: impl Into<String>) {
        self.generates.lock().unwrap().push_back(Err(error.into()));
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<OracleCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn generate_call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, OracleCall::Generate { .. }))
            .count()
    }
}

#[async_trait]
impl ContentOracle for ScriptedOracle {
    async fn search(&self, query: &str, lookback_days: u32) -> Result<String> {
        self.calls.lock().unwrap().push(OracleCall::Search {
            query: query.to_string(),
            lookback_days,
        });

        match self.searches.lock().unwrap().get(query) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(error)) => Err(MonitorError::Oracle(error.clone())),
            None => Err(MonitorError::Oracle(format!(
                "no scripted response for query: {query}"
            ))),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push(OracleCall::Generate {
            prompt: prompt.to_string(),
        });

        match self.generates.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(error)) => Err(MonitorError::Oracle(error)),
            None => Err(MonitorError::Oracle("generate queue empty".into())),
        }
    }
}
