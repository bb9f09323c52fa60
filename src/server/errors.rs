use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::conversation::ConversationError;
use crate::websearch::AnswerError;

/// Request failures as seen by HTTP callers. Only bad input is described to
/// the caller; everything else becomes a generic 500.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Answer(#[from] AnswerError),

    #[error(transparent)]
    Conversation(#[from] ConversationError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn is_cancelled(&self) -> bool {
        match self {
            ApiError::BadRequest(_) => false,
            ApiError::Answer(e) => e.is_cancelled(),
            ApiError::Conversation(e) => matches!(e, ConversationError::Cancelled(_)),
        }
    }

    fn log(&self) {
        match self {
            ApiError::BadRequest(reason) => warn!(%reason, "rejected request"),
            ApiError::Answer(AnswerError::Retrieval(e)) if !e.is_cancelled() => {
                error!(stage = %e.stage(), error = %e, "retrieval failed");
            }
            _ if self.is_cancelled() => warn!(error = %self, "request cancelled"),
            _ => error!(error = %self, "request failed"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        match self {
            ApiError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": reason }))).into_response()
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
                .into_response(),
        }
    }
}
