use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::fanout::cancellable;
use super::prompts;
use crate::llm::{LanguageModel, Message};

const SEARCH_REQUIRED: &str = "1";

/// Asks the model whether `query` needs a web search.
///
/// Never fails: a model error, cancellation or any reply other than `1`
/// counts as "no search needed".
pub async fn is_search_required(
    llm: &impl LanguageModel,
    query: &str,
    cancel: &CancellationToken,
) -> bool {
    let messages = [Message::system(prompts::SEARCH_NEEDED), Message::user(query)];

    match cancellable(cancel, llm.chat(&messages)).await {
        Ok(Ok(reply)) => {
            let required = reply.trim() == SEARCH_REQUIRED;
            debug!(reply = %reply.trim(), required, "search classification");
            required
        }
        Ok(Err(e)) => {
            warn!(error = %e, "search classification failed, answering without search");
            false
        }
        Err(_) => {
            debug!("search classification cancelled");
            false
        }
    }
}
