//! libSQL storage layer for digests, analyzed items, and theme trends.
//!
//! The [`Storage`] struct wraps a file-backed libSQL database. Schema
//! migrations run on every open and are idempotent. All period-scoped
//! writes are keyed by the period end date formatted `YYYY-MM-DD`, so
//! re-running a period replaces its data instead of accumulating rows.

mod migrations;

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Duration, NaiveDate, Utc};
use libsql::{Connection, Database, params};
use uuid::Uuid;

use esgmonitor_shared::{
    AnalyzedItem, Digest, Geography, Importance, MonitorError, PERIOD_DATE_FORMAT, Result,
    ThemeSummary, ThemeTrendPoint, period_key,
};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MonitorError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| MonitorError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| MonitorError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    MonitorError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Digest operations
    // -----------------------------------------------------------------------

    /// Insert or fully replace the digest for its period. Single statement,
    /// so a reader never observes a partially written digest.
    pub async fn upsert_digest(&self, digest: &Digest) -> Result<()> {
        let theme_summary_json = serde_json::to_string(&digest.theme_summary)
            .map_err(|e| MonitorError::Storage(format!("serialize theme summary: {e}")))?;
        let now = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO digests (period_end, content, theme_summary_json, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(period_end) DO UPDATE SET
                   content = excluded.content,
                   theme_summary_json = excluded.theme_summary_json,
                   created_at = excluded.created_at",
                params![
                    digest.period_key(),
                    digest.content.as_str(),
                    theme_summary_json.as_str(),
                    now.as_str()
                ],
            )
            .await
            .map_err(|e| MonitorError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get the digest for one period, if stored.
    pub async fn get_digest(&self, period_end: NaiveDate) -> Result<Option<Digest>> {
        let mut rows = self
            .conn
            .query(
                "SELECT period_end, content, theme_summary_json
                 FROM digests WHERE period_end = ?1",
                params![period_key(period_end)],
            )
            .await
            .map_err(|e| MonitorError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_digest(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(MonitorError::Storage(e.to_string())),
        }
    }

    /// The most recent `limit` digests, newest period first.
    pub async fn recent_digests(&self, limit: u32) -> Result<Vec<Digest>> {
        let mut rows = self
            .conn
            .query(
                "SELECT period_end, content, theme_summary_json
                 FROM digests ORDER BY period_end DESC LIMIT ?1",
                params![limit],
            )
            .await
            .map_err(|e| MonitorError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_digest(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Item operations
    // -----------------------------------------------------------------------

    /// Replace the analyzed items for one period: delete the period's rows,
    /// insert the new set.
    pub async fn replace_items(
        &self,
        period_end: NaiveDate,
        items: &[AnalyzedItem],
    ) -> Result<()> {
        let key = period_key(period_end);
        let now = Utc::now().to_rfc3339();

        self.conn
            .execute("DELETE FROM items WHERE period_end = ?1", params![key.as_str()])
            .await
            .map_err(|e| MonitorError::Storage(e.to_string()))?;

        for item in items {
            let id = Uuid::now_v7().to_string();
            self.conn
                .execute(
                    "INSERT INTO items (id, period_end, title, source, url, summary,
                                        theme, importance, relevance, geography, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    params![
                        id.as_str(),
                        key.as_str(),
                        item.title.as_str(),
                        item.source.as_str(),
                        item.url.as_deref(),
                        item.summary.as_str(),
                        item.theme.as_str(),
                        item.importance.as_str(),
                        item.relevance,
                        item.geography.as_str(),
                        now.as_str()
                    ],
                )
                .await
                .map_err(|e| MonitorError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    /// All stored items for one period, in insertion order.
    pub async fn items_for_period(&self, period_end: NaiveDate) -> Result<Vec<AnalyzedItem>> {
        let mut rows = self
            .conn
            .query(
                "SELECT title, source, url, summary, theme, importance, relevance, geography
                 FROM items WHERE period_end = ?1 ORDER BY id",
                params![period_key(period_end)],
            )
            .await
            .map_err(|e| MonitorError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_item(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Theme trend operations
    // -----------------------------------------------------------------------

    /// Upsert this period's mention count for each theme in the summary.
    ///
    /// Rows for themes absent from the summary are left in place. A re-run
    /// with fewer retained items therefore never erases previously recorded
    /// mentions for themes that merely dropped below the filter this time.
    pub async fn upsert_theme_trends(
        &self,
        period_end: NaiveDate,
        summary: &ThemeSummary,
    ) -> Result<()> {
        let key = period_key(period_end);

        for (theme, stat) in &summary.0 {
            self.conn
                .execute(
                    "INSERT INTO theme_trends (period_end, theme, mention_count)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(period_end, theme) DO UPDATE SET
                       mention_count = excluded.mention_count",
                    params![key.as_str(), theme.as_str(), stat.count],
                )
                .await
                .map_err(|e| MonitorError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    /// Theme trend series over a rolling window of `window_weeks`, newest
    /// period first within each theme. Pass a theme to restrict to one series.
    pub async fn theme_trends(
        &self,
        window_weeks: u32,
        theme: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<ThemeTrendPoint>>> {
        let cutoff = Utc::now().date_naive() - Duration::weeks(i64::from(window_weeks));
        let cutoff_key = period_key(cutoff);

        let mut rows = match theme {
            Some(theme) => self
                .conn
                .query(
                    "SELECT period_end, theme, mention_count FROM theme_trends
                     WHERE period_end >= ?1 AND theme = ?2
                     ORDER BY theme, period_end DESC",
                    params![cutoff_key.as_str(), theme],
                )
                .await ,
            None => self
                .conn
                .query(
                    "SELECT period_end, theme, mention_count FROM theme_trends
                     WHERE period_end >= ?1
                     ORDER BY theme, period_end DESC",
                    params![cutoff_key.as_str()],
                )
                .await,
        }
        .map_err(|e| MonitorError::Storage(e.to_string()))?;

        let mut results: BTreeMap<String, Vec<ThemeTrendPoint>> = BTreeMap::new();
        while let Ok(Some(row)) = rows.next().await {
            let period_end = parse_period(
                &row.get::<String>(0)
                    .map_err(|e| MonitorError::Storage(e.to_string()))?,
            )?;
            let theme: String = row
                .get(1)
                .map_err(|e| MonitorError::Storage(e.to_string()))?;
            let mention_count = row
                .get::<u32>(2)
                .map_err(|e| MonitorError::Storage(e.to_string()))?;

            results.entry(theme.clone()).or_default().push(ThemeTrendPoint {
                period_end,
                theme,
                mention_count,
            });
        }
        Ok(results)
    }
}

fn parse_period(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, PERIOD_DATE_FORMAT)
        .map_err(|e| MonitorError::Storage(format!("invalid period date {s:?}: {e}")))
}

/// Convert a database row to a [`Digest`].
fn row_to_digest(row: &libsql::Row) -> Result<Digest> {
    let period: String = row
        .get(0)
        .map_err(|e| MonitorError::Storage(e.to_string()))?;
    let content: String = row
        .get(1)
        .map_err(|e| MonitorError::Storage(e.to_string()))?;
    let summary_json: String = row
        .get(2)
        .map_err(|e| MonitorError::Storage(e.to_string()))?;

    Ok(Digest {
        period_end: parse_period(&period)?,
        content,
        theme_summary: serde_json::from_str(&summary_json)
            .map_err(|e| MonitorError::Storage(format!("invalid theme summary JSON: {e}")))?,
    })
}

/// Convert a database row to an [`AnalyzedItem`].
fn row_to_item(row: &libsql::Row) -> Result<AnalyzedItem> {
    let importance: String = row
        .get(5)
        .map_err(|e| MonitorError::Storage(e.to_string()))?;
    let geography: String = row
        .get(7)
        .map_err(|e| MonitorError::Storage(e.to_string()))?;

    Ok(AnalyzedItem {
        title: row
            .get::<String>(0)
            .map_err(|e| MonitorError::Storage(e.to_string()))?,
        source: row
            .get::<String>(1)
            .map_err(|e| MonitorError::Storage(e.to_string()))?,
        url: row.get::<String>(2).ok(),
        summary: row
            .get::<String>(3)
            .map_err(|e| MonitorError::Storage(e.to_string()))?,
        theme: row
            .get::<String>(4)
            .map_err(|e| MonitorError::Storage(e.to_string()))?,
        importance: Importance::from_label(&importance),
        relevance: row
            .get::<f64>(6)
            .map_err(|e| MonitorError::Storage(e.to_string()))?,
        geography: Geography::from_label(&geography),
    })
}
