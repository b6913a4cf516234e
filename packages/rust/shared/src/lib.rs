//! Shared types, error model, and configuration for the ESG monitor.
//!
//! This crate is the foundation depended on by all other monitor crates.
//! It provides:
//! - [`MonitorError`] — the unified error type
//! - Domain types ([`Query`], [`RawResult`], [`AnalyzedItem`], [`Digest`])
//! - The query catalog and theme lexicon ([`QueryCatalog`], [`ThemeLexicon`])
//! - Configuration ([`AppConfig`], config loading)

pub mod catalog;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use catalog::{CatalogCategory, QueryCatalog, ThemeEntry, ThemeLexicon, default_catalog};
pub use config::{
    AppConfig, DefaultsConfig, OracleConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, validate_api_key,
};
pub use error::{MonitorError, Result};
pub use types::{
    AnalyzedItem, Digest, Geography, Importance, PERIOD_DATE_FORMAT, Query, RawResult, ThemeStat,
    ThemeSummary, ThemeTrendPoint, period_key,
};
