//! Collection phase: fan the query catalog out through the oracle.
//!
//! Queries run strictly sequentially — the oracle client is rate limited
//! and a shared resource, so there is nothing to gain from concurrency
//! here. Order is deterministic: categories in catalog order, queries in
//! declared order.

use tracing::{info, instrument};

use esgmonitor_oracle::OracleClient;
use esgmonitor_shared::{QueryCatalog, RawResult};

/// Run every catalog query and aggregate the results, failures included.
/// An empty catalog yields an empty Vec; a failed query yields a
/// [`RawResult`] with an error marker, never an early return.
#[instrument(skip_all, fields(queries = catalog.query_count()))]
pub async fn collect(
    catalog: &QueryCatalog,
    client: &OracleClient,
    lookback_days: u32,
) -> Vec<RawResult> {
    let queries = catalog.queries();
    let total = queries.len();
    let mut results = Vec::with_capacity(total);

    for (i, query) in queries.iter().enumerate() {
        info!(
            category = %query.category,
            query = %query.text,
            "collecting query {}/{}",
            i + 1,
            total
        );
        results.push(client.invoke(query, lookback_days).await);
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    info!(collected = results.len(), failed, "collection complete");

    results
}
