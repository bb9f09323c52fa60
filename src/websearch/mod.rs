//! Retrieval-augmented answering: decide whether to search, plan domain-scoped
//! queries, fan out searches, rank candidates, scrape the best pages, answer.

mod answer;
mod classifier;
mod fanout;
mod pipeline;
mod planner;
mod prompts;
mod scoring;
mod scrape;
mod search;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use answer::{AnswerError, answer_query, generate_answer};
pub use classifier::is_search_required;
pub use fanout::Cancelled;
pub(crate) use fanout::cancellable;
pub use pipeline::{Orchestrator, PipelineError, Retrieval, Stage};
pub use planner::{PlanningError, plan};
pub use scoring::{ScoringError, TOP_K, score};
pub use scrape::{ScrapeError, scrape_all};
pub use search::{SearchError, search_all};
pub use types::{
    AllowedDomain, CandidatePage, PlannedQuery, QueryPlan, ScoredCandidate, ScrapedPage,
    SearchBatch, SelectedPage,
};
