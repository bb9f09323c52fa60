//! Staged retrieval: classify, plan, search, score, scrape.
//!
//! Stages run strictly one after another; work inside a stage fans out.
//! The first stage failure ends the run, nothing is retried.

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::classifier::is_search_required;
use super::planner::{PlanningError, plan};
use super::scoring::{ScoringError, score};
use super::scrape::{ScrapeError, scrape_all};
use super::search::{SearchError, search_all};
use super::types::{AllowedDomain, QueryPlan, ScrapedPage, SelectedPage};
use crate::llm::LanguageModel;
use crate::provider::SearchProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Classifying,
    Planning,
    Searching,
    Scoring,
    Scraping,
    Done,
    Failed,
}

impl Stage {
    fn can_advance_to(self, next: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, next),
            (Idle, Classifying)
                | (Classifying, Done | Planning)
                | (Planning, Searching)
                | (Searching, Scoring)
                | (Scoring, Scraping)
                | (Scraping, Done)
                | (Classifying | Planning | Searching | Scoring | Scraping, Failed)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Classifying => "classifying",
            Stage::Planning => "planning",
            Stage::Searching => "searching",
            Stage::Scoring => "scoring",
            Stage::Scraping => "scraping",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("cancelled while {0}")]
    Cancelled(Stage),

    #[error("planning failed: {0}")]
    Planning(#[from] PlanningError),

    #[error("search failed: {0}")]
    Search(#[from] SearchError),

    #[error("scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("scrape failed: {0}")]
    Scrape(#[from] ScrapeError),
}

impl PipelineError {
    /// The stage that was running when the pipeline failed.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Cancelled(stage) => *stage,
            PipelineError::Planning(_) => Stage::Planning,
            PipelineError::Search(_) => Stage::Searching,
            PipelineError::Scoring(_) => Stage::Scoring,
            PipelineError::Scrape(_) => Stage::Scraping,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            PipelineError::Cancelled(_)
                | PipelineError::Planning(PlanningError::Cancelled(_))
                | PipelineError::Search(SearchError::Cancelled(_))
                | PipelineError::Scoring(ScoringError::Cancelled(_))
                | PipelineError::Scrape(ScrapeError::Cancelled(_))
        )
    }
}

/// Successful pipeline outcome handed to answer generation.
#[derive(Debug, Clone)]
pub enum Retrieval {
    /// The classifier decided the query can be answered without searching.
    NoSearch,
    Searched {
        plan: QueryPlan,
        selected: Vec<SelectedPage>,
        pages: Vec<ScrapedPage>,
    },
}

impl Retrieval {
    pub fn pages(&self) -> &[ScrapedPage] {
        match self {
            Retrieval::NoSearch => &[],
            Retrieval::Searched { pages, .. } => pages,
        }
    }
}

/// Sequences the retrieval stages for one request.
pub struct Orchestrator<'a, M, P> {
    llm: &'a M,
    provider: &'a P,
    domains: &'a [AllowedDomain],
    stage: Stage,
}

impl<'a, M: LanguageModel, P: SearchProvider> Orchestrator<'a, M, P> {
    pub fn new(llm: &'a M, provider: &'a P, domains: &'a [AllowedDomain]) -> Self {
        Self {
            llm,
            provider,
            domains,
            stage: Stage::Idle,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub async fn run(
        &mut self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Retrieval, PipelineError> {
        self.stage = Stage::Idle;
        let outcome = self.run_stages(query, cancel).await;
        if let Err(e) = &outcome {
            warn!(stage = %e.stage(), error = %e, "retrieval failed");
            self.advance(Stage::Failed);
        }
        outcome
    }

    async fn run_stages(
        &mut self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Retrieval, PipelineError> {
        self.advance(Stage::Classifying);
        let required = is_search_required(self.llm, query, cancel).await;
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled(Stage::Classifying));
        }
        if !required {
            self.advance(Stage::Done);
            info!("search not required");
            return Ok(Retrieval::NoSearch);
        }

        self.advance(Stage::Planning);
        let plan = plan(self.llm, query, self.domains, cancel).await?;

        self.advance(Stage::Searching);
        let batches = search_all(self.provider, &plan, cancel).await?;

        self.advance(Stage::Scoring);
        let selected = score(self.llm, &batches, query, cancel).await?;

        self.advance(Stage::Scraping);
        let pages = scrape_all(self.provider, &selected, cancel).await?;

        self.advance(Stage::Done);
        info!(
            queries = plan.queries.len(),
            selected = selected.len(),
            pages = pages.len(),
            "retrieval complete"
        );
        Ok(Retrieval::Searched {
            plan,
            selected,
            pages,
        })
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal stage transition {} -> {next}",
            self.stage
        );
        debug!(from = %self.stage, to = %next, "stage transition");
        self.stage = next;
    }
}
