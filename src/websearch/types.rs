use serde::{Deserialize, Serialize};

/// A domain the planner may scope searches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedDomain {
    pub name: String,
    pub url: String,
}

/// One domain-scoped search, as produced by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedQuery {
    #[serde(rename = "q")]
    pub text: String,
    #[serde(rename = "url")]
    pub target_domain_url: String,
}

/// Planner output. Zero queries is a valid "nothing worth searching" outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPlan {
    #[serde(rename = "_thoughts", default)]
    pub rationale: String,
    pub queries: Vec<PlannedQuery>,
}

/// A SERP entry. Identified by `url`; duplicates across batches are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePage {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Candidates returned for one planned query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBatch {
    pub source_query: String,
    pub candidates: Vec<CandidatePage>,
}

/// A candidate with its model-assigned relevance in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub page: CandidatePage,
    pub relevance: f64,
    pub rationale: String,
}

/// One of the top-ranked candidates chosen for scraping.
pub type SelectedPage = ScoredCandidate;

/// Full page content. An empty `content` means the page had no extractable body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapedPage {
    pub page: CandidatePage,
    pub content: String,
}
