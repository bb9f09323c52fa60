use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::fanout::{Cancelled, cancellable};
use super::pipeline::{Orchestrator, PipelineError, Retrieval};
use super::prompts;
use super::types::AllowedDomain;
use crate::llm::{LanguageModel, Message, ModelError};
use crate::provider::SearchProvider;

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] PipelineError),

    #[error("answer generation failed: {0}")]
    Model(#[from] ModelError),

    #[error("answer generation {0}")]
    Cancelled(#[from] Cancelled),
}

impl AnswerError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            AnswerError::Retrieval(e) => e.is_cancelled(),
            AnswerError::Model(_) => false,
            AnswerError::Cancelled(_) => true,
        }
    }
}

/// Answers `query` from the retrieved pages, or from general knowledge when
/// retrieval produced none.
pub async fn generate_answer(
    llm: &impl LanguageModel,
    query: &str,
    retrieval: &Retrieval,
    cancel: &CancellationToken,
) -> Result<String, AnswerError> {
    let messages = [
        Message::system(prompts::answer_with(retrieval.pages())),
        Message::user(query),
    ];
    let answer = cancellable(cancel, llm.chat(&messages)).await??;
    debug!(chars = answer.len(), "answer generated");
    Ok(answer)
}

/// Runs retrieval and answer generation for one query.
pub async fn answer_query(
    llm: &impl LanguageModel,
    provider: &impl SearchProvider,
    domains: &[AllowedDomain],
    query: &str,
    cancel: &CancellationToken,
) -> Result<String, AnswerError> {
    let retrieval = Orchestrator::new(llm, provider, domains)
        .run(query, cancel)
        .await?;
    info!(pages = retrieval.pages().len(), "answering");
    generate_answer(llm, query, &retrieval, cancel).await
}
