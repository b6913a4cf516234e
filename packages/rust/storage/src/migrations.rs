//! SQL migration definitions for the monitor database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed as one batch.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: digests, items, theme_trends",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One digest per reporting period, keyed by period end date (YYYY-MM-DD)
CREATE TABLE IF NOT EXISTS digests (
    period_end         TEXT PRIMARY KEY,
    content            TEXT NOT NULL,
    theme_summary_json TEXT NOT NULL,
    created_at         TEXT NOT NULL
);

-- Analyzed items retained for a period; fully replaced on re-run
CREATE TABLE IF NOT EXISTS items (
    id         TEXT PRIMARY KEY,
    period_end TEXT NOT NULL,
    title      TEXT NOT NULL,
    source     TEXT NOT NULL,
    url        TEXT,
    summary    TEXT NOT NULL,
    theme      TEXT NOT NULL,
    importance TEXT NOT NULL,
    relevance  REAL NOT NULL,
    geography  TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_period ON items(period_end);
CREATE INDEX IF NOT EXISTS idx_items_theme ON items(theme);

-- Per-period per-theme mention counts for trend queries
CREATE TABLE IF NOT EXISTS theme_trends (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    period_end    TEXT NOT NULL,
    theme         TEXT NOT NULL,
    mention_count INTEGER NOT NULL,
    UNIQUE(period_end, theme)
);

CREATE INDEX IF NOT EXISTS idx_trends_theme ON theme_trends(theme);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
