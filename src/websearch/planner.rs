use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::fanout::{Cancelled, cancellable};
use super::prompts;
use super::types::{AllowedDomain, PlannedQuery, QueryPlan};
use crate::llm::{LanguageModel, Message, ModelError};

#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error("query planning model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("query plan is not valid JSON of the expected shape: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{0}")]
    Cancelled(#[from] Cancelled),
}

/// Asks the model for domain-scoped search queries over `domains`.
///
/// Queries whose `url` is not on the allow-list are dropped. An empty plan is
/// a valid outcome.
pub async fn plan(
    llm: &impl LanguageModel,
    query: &str,
    domains: &[AllowedDomain],
    cancel: &CancellationToken,
) -> Result<QueryPlan, PlanningError> {
    let messages = [
        Message::system(prompts::plan_queries(domains)),
        Message::user(query),
    ];

    let reply = cancellable(cancel, llm.chat(&messages)).await??;
    let mut plan: QueryPlan = serde_json::from_str(reply.trim())?;

    let planned = plan.queries.len();
    plan.queries.retain(|q| is_allowed(q, domains));
    if plan.queries.len() < planned {
        warn!(
            dropped = planned - plan.queries.len(),
            "planner proposed domains outside the allow-list"
        );
    }

    debug!(queries = plan.queries.len(), rationale = %plan.rationale, "query plan ready");
    Ok(plan)
}

fn is_allowed(query: &PlannedQuery, domains: &[AllowedDomain]) -> bool {
    let Some(host) = host_of(&query.target_domain_url) else {
        return false;
    };
    domains
        .iter()
        .any(|d| host_of(&d.url).is_some_and(|allowed| allowed == host))
}

fn host_of(raw: &str) -> Option<String> {
    url::Url::parse(raw)
        .ok()?
        .host_str()
        .map(|h| h.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websearch::testing::MockModel;

    fn wikipedia() -> Vec<AllowedDomain> {
        vec![AllowedDomain {
            name: "Wikipedia".into(),
            url: "https://en.wikipedia.org".into(),
        }]
    }

    #[tokio::test]
    async fn marie_curie_plan_targets_allow_listed_domain() {
        let model = MockModel::replying(
            r#"{"_thoughts": "1. Person. 2. Encyclopedia.",
                "queries": [{"q": "Marie Curie", "url": "https://en.wikipedia.org"}]}"#,
        );

        let plan = plan(&model, "Who is Marie Curie?", &wikipedia(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(!plan.queries.is_empty());
        assert!(
            plan.queries
                .iter()
                .any(|q| q.target_domain_url == "https://en.wikipedia.org")
        );

        let system = &model.calls()[0][0].content;
        assert!(system.contains("Wikipedia: https://en.wikipedia.org"));
    }

    #[tokio::test]
    async fn empty_queries_is_a_valid_plan() {
        let model = MockModel::replying(r#"{"_thoughts": "nothing to look up", "queries": []}"#);
        let plan = plan(&model, "Write a poem", &wikipedia(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(plan.queries.is_empty());
        assert_eq!(plan.rationale, "nothing to look up");
    }

    #[tokio::test]
    async fn non_json_reply_is_malformed() {
        let model = MockModel::replying("Sure! Here are some queries: ...");
        let err = plan(&model, "q", &wikipedia(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PlanningError::Malformed(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn wrong_shape_is_malformed() {
        let model = MockModel::replying(r#"{"_thoughts": "x", "queries": [{"query": "a"}]}"#);
        let err = plan(&model, "q", &wikipedia(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PlanningError::Malformed(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn model_failure_is_planning_error() {
        let model = MockModel::failing();
        let err = plan(&model, "q", &wikipedia(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PlanningError::Model(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn cancelled_planning_reports_cancellation() {
        let model = MockModel::hanging();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = plan(&model, "q", &wikipedia(), &cancel).await.unwrap_err();
        assert!(matches!(err, PlanningError::Cancelled(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn queries_outside_allow_list_are_dropped() {
        let model = MockModel::replying(
            r#"{"_thoughts": "x", "queries": [
                {"q": "a", "url": "https://youtube.com"},
                {"q": "b", "url": "https://en.wikipedia.org/"},
                {"q": "c", "url": "not a url"}
            ]}"#,
        );

        let plan = plan(&model, "q", &wikipedia(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(plan.queries.len(), 1);
        assert_eq!(plan.queries[0].text, "b");
    }
}
