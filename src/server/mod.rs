//! HTTP surface: one-shot answers and summarising threads.

mod errors;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use errors::ApiError;

use crate::conversation::{self, Session};
use crate::llm::LanguageModel;
use crate::provider::SearchProvider;
use crate::websearch::{AllowedDomain, answer_query};

/// Shared by every handler. Clients sit behind `Arc` so cloning per request is cheap.
pub struct AppState<M, P> {
    llm: Arc<M>,
    provider: Arc<P>,
    domains: Arc<[AllowedDomain]>,
    shutdown: CancellationToken,
    request_timeout: Duration,
}

impl<M, P> Clone for AppState<M, P> {
    fn clone(&self) -> Self {
        Self {
            llm: Arc::clone(&self.llm),
            provider: Arc::clone(&self.provider),
            domains: Arc::clone(&self.domains),
            shutdown: self.shutdown.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl<M, P> AppState<M, P> {
    /// `shutdown` is the root token; cancelling it cancels every in-flight request
    /// and stops the listener.
    pub fn new(
        llm: M,
        provider: P,
        domains: Vec<AllowedDomain>,
        shutdown: CancellationToken,
        request_timeout: Duration,
    ) -> Self {
        Self {
            llm: Arc::new(llm),
            provider: Arc::new(provider),
            domains: domains.into(),
            shutdown,
            request_timeout,
        }
    }

    /// A child of the shutdown token that also fires once the request deadline passes.
    fn request_token(&self) -> CancellationToken {
        let token = self.shutdown.child_token();
        let deadline = token.clone();
        let timeout = self.request_timeout;
        tokio::spawn(async move {
            tokio::select! {
                () = deadline.cancelled() => {}
                () = tokio::time::sleep(timeout) => {
                    warn!(timeout_secs = timeout.as_secs_f64(), "request deadline exceeded");
                    deadline.cancel();
                }
            }
        });
        token
    }
}

#[derive(Debug, Deserialize)]
struct WebsearchRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct WebsearchResponse {
    answer: String,
}

#[derive(Debug, Deserialize)]
struct ThreadRequest {
    message: String,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Serialize)]
struct ThreadResponse {
    answer: String,
    summary: String,
}

pub fn router<M, P>(state: AppState<M, P>) -> Router
where
    M: LanguageModel + Send + Sync + 'static,
    P: SearchProvider + Send + Sync + 'static,
{
    Router::new()
        .route("/api/websearch", post(websearch::<M, P>))
        .route("/api/thread", post(thread::<M, P>))
        .with_state(state)
}

/// Binds `addr` and serves until the state's shutdown token is cancelled.
pub async fn serve<M, P>(addr: SocketAddr, state: AppState<M, P>) -> std::io::Result<()>
where
    M: LanguageModel + Send + Sync + 'static,
    P: SearchProvider + Send + Sync + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    run(listener, state).await
}

async fn run<M, P>(listener: TcpListener, state: AppState<M, P>) -> std::io::Result<()>
where
    M: LanguageModel + Send + Sync + 'static,
    P: SearchProvider + Send + Sync + 'static,
{
    info!(addr = %listener.local_addr()?, "listening");
    let shutdown = state.shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("server stopped");
    Ok(())
}

fn require_message(message: &str) -> Result<&str, ApiError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }
    Ok(trimmed)
}

async fn websearch<M, P>(
    State(state): State<AppState<M, P>>,
    body: Result<Json<WebsearchRequest>, JsonRejection>,
) -> Result<Json<WebsearchResponse>, ApiError>
where
    M: LanguageModel + Send + Sync + 'static,
    P: SearchProvider + Send + Sync + 'static,
{
    let Json(request) = body?;
    let message = require_message(&request.message)?;
    info!(chars = message.len(), "websearch request");

    let cancel = state.request_token();
    let _done = cancel.clone().drop_guard();
    let answer = answer_query(
        &*state.llm,
        &*state.provider,
        &state.domains,
        message,
        &cancel,
    )
    .await?;

    Ok(Json(WebsearchResponse { answer }))
}

async fn thread<M, P>(
    State(state): State<AppState<M, P>>,
    body: Result<Json<ThreadRequest>, JsonRejection>,
) -> Result<Json<ThreadResponse>, ApiError>
where
    M: LanguageModel + Send + Sync + 'static,
    P: SearchProvider + Send + Sync + 'static,
{
    let Json(request) = body?;
    let message = require_message(&request.message)?;
    let session = Session {
        summary: request.summary.unwrap_or_default(),
    };
    info!(chars = message.len(), has_summary = !session.summary.is_empty(), "thread request");

    let cancel = state.request_token();
    let _done = cancel.clone().drop_guard();
    let reply = conversation::reply(&*state.llm, &session, message, &cancel).await?;

    Ok(Json(ThreadResponse {
        answer: reply.answer,
        summary: reply.session.summary,
    }))
}
