//! Full-cycle summarization route.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use super::anonymize::TextInput;
use super::{request_language, ApiError};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/summarize", post(summarize_text))
}

async fn summarize_text(
    State(state): State<Arc<AppState>>,
    Json(input): Json<TextInput>,
) -> Response {
    let pipeline = match state.pipeline() {
        Ok(p) => p,
        Err(e) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let language = match request_language(&state, input.language.as_deref()) {
        Ok(language) => language,
        Err(e) => return e.into_response(),
    };

    match pipeline.process_as(&input.text, &language).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
