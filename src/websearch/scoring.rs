use std::cmp::Ordering;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use super::fanout::{Cancelled, join_fail_fast};
use super::prompts;
use super::types::{CandidatePage, ScoredCandidate, SearchBatch, SelectedPage};
use crate::llm::{LanguageModel, Message, ModelError};

/// Number of pages kept for scraping.
pub const TOP_K: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("scoring {url} failed: {source}")]
    Model {
        url: String,
        #[source]
        source: ModelError,
    },

    #[error("score for {url} is not valid JSON of the expected shape: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("score for {url} is outside [0, 1]: {score}")]
    OutOfRange { url: String, score: f64 },

    #[error("{0}")]
    Cancelled(#[from] Cancelled),
}

#[derive(Debug, Deserialize)]
struct ScoreReply {
    reason: String,
    score: f64,
}

/// Scores every candidate against `original_query` and returns the top [`TOP_K`].
///
/// Candidates are not deduplicated. Any failed or undecodable score fails the
/// whole stage.
pub async fn score(
    llm: &impl LanguageModel,
    batches: &[SearchBatch],
    original_query: &str,
    cancel: &CancellationToken,
) -> Result<Vec<SelectedPage>, ScoringError> {
    let mut tasks = Vec::new();
    for batch in batches {
        for page in &batch.candidates {
            tasks.push(Box::pin(score_one(llm, page, &batch.source_query, original_query)));
        }
    }
    let scored = join_fail_fast(cancel, tasks).await?;

    let total = scored.len();
    let selected = select_top(scored, TOP_K);
    info!(candidates = total, selected = selected.len(), "scoring complete");
    Ok(selected)
}

async fn score_one(
    llm: &impl LanguageModel,
    page: &CandidatePage,
    generated_query: &str,
    original_query: &str,
) -> Result<ScoredCandidate, ScoringError> {
    let messages = [
        Message::system(prompts::SCORE_RELEVANCE),
        Message::user(prompts::score_candidate(page, generated_query, original_query)),
    ];

    let reply = llm.chat(&messages).await.map_err(|source| ScoringError::Model {
        url: page.url.clone(),
        source,
    })?;

    let parsed: ScoreReply =
        serde_json::from_str(reply.trim()).map_err(|source| ScoringError::Malformed {
            url: page.url.clone(),
            source,
        })?;

    if !(0.0..=1.0).contains(&parsed.score) {
        return Err(ScoringError::OutOfRange {
            url: page.url.clone(),
            score: parsed.score,
        });
    }

    let relevance = if is_named_in(original_query, &page.url) {
        debug!(url = %page.url, model_score = parsed.score, "query names this URL, scoring 1.0");
        1.0
    } else {
        parsed.score
    };

    debug!(url = %page.url, score = relevance, reason = %parsed.reason, "candidate scored");
    Ok(ScoredCandidate {
        page: page.clone(),
        relevance,
        rationale: parsed.reason,
    })
}

/// Whether `query` spells out `page_url`, ignoring scheme, fragment and a trailing slash.
fn is_named_in(query: &str, page_url: &str) -> bool {
    let Ok(target) = Url::parse(page_url) else {
        return false;
    };
    query
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric() && c != '/'))
        .filter_map(|word| Url::parse(word).ok())
        .any(|named| same_resource(&named, &target))
}

fn same_resource(a: &Url, b: &Url) -> bool {
    a.host_str().is_some()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
        && a.path().trim_end_matches('/') == b.path().trim_end_matches('/')
        && a.query() == b.query()
}

/// Highest relevance first; equal scores keep their input order.
///
/// Relevance is range-checked before it gets here, so `partial_cmp` only
/// sees finite values and treats `-0.0` and `0.0` as a tie.
fn select_top(mut scored: Vec<ScoredCandidate>, k: usize) -> Vec<SelectedPage> {
    scored.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(Ordering::Equal)
    });
    scored.truncate(k);
    scored
}
