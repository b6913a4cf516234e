//! Application configuration for the ESG monitor.
//!
//! User config lives at `~/.esgmonitor/esgmonitor.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{QueryCatalog, ThemeLexicon};
use crate::error::{MonitorError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "esgmonitor.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".esgmonitor";

// ---------------------------------------------------------------------------
// Config structs (matching esgmonitor.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Content oracle settings.
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Category → queries catalog (built-in defaults when omitted).
    #[serde(default)]
    pub catalog: QueryCatalog,

    /// Theme lexicon (built-in defaults when omitted).
    #[serde(default)]
    pub themes: ThemeLexicon,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Lookback window for one reporting period, in days.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Minimum relevance score for an item to be retained.
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f64,

    /// Maximum highlight summaries kept per theme.
    #[serde(default = "default_max_items_per_category")]
    pub max_items_per_category: usize,

    /// Maximum entries in the top-stories ranking.
    #[serde(default = "default_top_stories_cap")]
    pub top_stories_cap: usize,

    /// Directory for digest markdown output.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Path to the tracking database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            relevance_threshold: default_relevance_threshold(),
            max_items_per_category: default_max_items_per_category(),
            top_stories_cap: default_top_stories_cap(),
            output_dir: default_output_dir(),
            database_path: default_database_path(),
        }
    }
}

fn default_lookback_days() -> u32 {
    7
}
fn default_relevance_threshold() -> f64 {
    0.6
}
fn default_max_items_per_category() -> usize {
    5
}
fn default_top_stories_cap() -> usize {
    5
}
fn default_output_dir() -> String {
    "outputs".into()
}
fn default_database_path() -> String {
    "data/esg_monitor.db".into()
}

/// `[oracle]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model ID used for search and generation.
    #[serde(default = "default_model")]
    pub model: String,

    /// Minimum ms between consecutive oracle calls. This is quota pacing,
    /// not failure backoff; the delay applies before every call.
    #[serde(default = "default_call_delay_ms")]
    pub call_delay_ms: u64,

    /// Max tokens per oracle response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            call_delay_ms: default_call_delay_ms(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".into()
}
fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_call_delay_ms() -> u64 {
    60_000
}
fn default_max_tokens() -> u32 {
    4096
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.esgmonitor/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| MonitorError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.esgmonitor/esgmonitor.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| MonitorError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| MonitorError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| MonitorError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| MonitorError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| MonitorError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the oracle API key env var is set and non-empty.
/// This is fatal at startup — no run begins without a credential.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    let var_name = &config.oracle.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(MonitorError::config(format!(
            "oracle API key not found. Set the {var_name} environment variable."
        ))),
    }
}
