//! Content oracle: search and generation backed by the Anthropic Messages API.
//!
//! The pipeline talks to the oracle through two seams:
//! - [`ContentOracle`] — provider trait (search with the web-search tool,
//!   freeform generation). [`AnthropicOracle`] is the production
//!   implementation; [`ScriptedOracle`] is the deterministic fake.
//! - [`OracleClient`] — pacing wrapper that spaces calls to respect request
//!   quotas and folds per-query failures into [`RawResult`] markers.
//!
//! [`RawResult`]: esgmonitor_shared::RawResult

mod anthropic;
mod client;
mod scripted;
mod traits;
mod wire;

pub use anthropic::AnthropicOracle;
pub use client::OracleClient;
pub use scripted::{OracleCall, ScriptedOracle};
pub use traits::ContentOracle;
