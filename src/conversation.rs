//! Short-answer chat that carries a running summary instead of full history.
//!
//! The summary lives in a [`Session`] value owned by the caller; each reply
//! returns the next session.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::llm::{LanguageModel, Message, ModelError};
use crate::websearch::{Cancelled, cancellable};

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("conversation model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("conversation {0}")]
    Cancelled(#[from] Cancelled),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub answer: String,
    pub session: Session,
}

/// Answers `message` in the context of `session` and summarises the turn.
pub async fn reply(
    llm: &impl LanguageModel,
    session: &Session,
    message: &str,
    cancel: &CancellationToken,
) -> Result<Reply, ConversationError> {
    let answer = cancellable(
        cancel,
        llm.chat(&[
            Message::system(format!(
                "You are a helpful assistant who speaks using as few words as possible. \
                 <summary>{}</summary>",
                session.summary
            )),
            Message::user(message),
        ]),
    )
    .await??;

    let summary = cancellable(
        cancel,
        llm.chat(&[
            Message::system(summary_prompt(&session.summary, message, &answer)),
            Message::user("Please summarize the conversation briefly."),
        ]),
    )
    .await??;

    debug!(summary_chars = summary.len(), "conversation summary updated");
    Ok(Reply {
        answer,
        session: Session { summary },
    })
}

fn summary_prompt(previous: &str, user: &str, assistant: &str) -> String {
    format!(
        "Summarize the conversation concisely, folding in the previous summary if there is one.\n\
         <previous_summary>{previous}</previous_summary>\n\
         <current_turn>\nUser: {user}\nAssistant: {assistant}\n</current_turn>"
    )
}
