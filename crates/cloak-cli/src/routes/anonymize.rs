//! Detection, anonymization and restoration routes. None of these call the
//! summarizer.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use cloak_protocol::{restore_report, MapEntry, PlaceholderMap, Restoration};
use cloak_runtime::{anonymize, Anonymized};
use serde::Deserialize;

use super::{request_language, ApiError};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/detect", post(detect_spans))
        .route("/anonymize", post(anonymize_text))
        .route("/restore", post(restore_text))
}

#[derive(Deserialize)]
pub(crate) struct TextInput {
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Deserialize)]
struct RestoreInput {
    text: String,
    map: Vec<MapEntry>,
}

async fn detect_spans(
    State(state): State<Arc<AppState>>,
    Json(input): Json<TextInput>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let language = request_language(&state, input.language.as_deref())?;
    let spans = state.adapter.detect(&input.text, &language)?;
    Ok(Json(serde_json::json!({
        "spans": spans,
        "count": spans.len(),
    })))
}

async fn anonymize_text(
    State(state): State<Arc<AppState>>,
    Json(input): Json<TextInput>,
) -> Result<Json<Anonymized>, ApiError> {
    let language = request_language(&state, input.language.as_deref())?;
    Ok(Json(anonymize(&state.adapter, &input.text, &language)?))
}

async fn restore_text(Json(input): Json<RestoreInput>) -> Result<Json<Restoration>, ApiError> {
    let map = PlaceholderMap::from_entries(input.map)?;
    Ok(Json(restore_report(&input.text, &map)))
}
