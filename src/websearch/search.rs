use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::fanout::{Cancelled, join_fail_fast};
use super::types::{PlannedQuery, QueryPlan, SearchBatch};
use crate::provider::{ProviderError, SearchProvider, SearchRequest};

const RESULTS_PER_QUERY: u32 = 3;
const SEARCH_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search for '{query}' failed: {source}")]
    Provider {
        query: String,
        #[source]
        source: ProviderError,
    },

    #[error("{0}")]
    Cancelled(#[from] Cancelled),
}

/// Runs one site-scoped search per planned query, concurrently.
///
/// Any failed search fails the whole batch; partial results are discarded.
pub async fn search_all(
    provider: &impl SearchProvider,
    plan: &QueryPlan,
    cancel: &CancellationToken,
) -> Result<Vec<SearchBatch>, SearchError> {
    if plan.queries.is_empty() {
        debug!("empty query plan, skipping search");
        return Ok(Vec::new());
    }

    let mut tasks = Vec::with_capacity(plan.queries.len());
    for query in &plan.queries {
        tasks.push(Box::pin(search_one(provider, query)));
    }
    let batches = join_fail_fast(cancel, tasks).await?;

    info!(
        queries = batches.len(),
        candidates = batches.iter().map(|b| b.candidates.len()).sum::<usize>(),
        "search complete"
    );
    Ok(batches)
}

async fn search_one(
    provider: &impl SearchProvider,
    query: &PlannedQuery,
) -> Result<SearchBatch, SearchError> {
    let request = SearchRequest {
        query: site_query(query),
        limit: RESULTS_PER_QUERY,
        timeout: SEARCH_TIMEOUT_MS,
    };

    let candidates = provider
        .search(&request)
        .await
        .map_err(|source| SearchError::Provider {
            query: request.query.clone(),
            source,
        })?;

    Ok(SearchBatch {
        source_query: query.text.clone(),
        candidates,
    })
}

fn site_query(query: &PlannedQuery) -> String {
    format!("site:{} {}", query.target_domain_url, query.text)
}
