//! HTTP route handlers.
//!
//! The server is stateless with respect to documents: `/anonymize` returns
//! the placeholder map and `/restore` takes it back from the client.

pub mod anonymize;
pub mod summarize;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use cloak_core::{Error, Language};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(anonymize::routes())
        .merge(summarize::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "detectors": state.adapter.detector_names(),
        "languages": state.adapter.supported_languages(),
        "summarizer": state.pipeline.is_some(),
    }))
}

/// A pipeline error rendered as a JSON body with its stage.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::EmptyDocument
            | Error::UnsupportedLanguage(_)
            | Error::InvalidSpan { .. }
            | Error::InvalidMap(_) => StatusCode::BAD_REQUEST,
            Error::SummarizerUnavailable { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({
            "error": self.0.to_string(),
            "stage": self.0.stage(),
            "retryable": self.0.is_retryable(),
        });
        (status, Json(body)).into_response()
    }
}

/// Resolve an optional request language against the configured default.
pub(crate) fn request_language(
    state: &AppState,
    requested: Option<&str>,
) -> Result<Language, ApiError> {
    match requested {
        Some(tag) => Ok(Language::parse(tag)?),
        None => Ok(state.config.default_language.clone()),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use cloak_core::{CloakConfig, Result};
    use cloak_summarize::Summarizer;
    use futures::future::BoxFuture;
    use tower::ServiceExt;

    use super::*;

    struct Shouting;

    impl Summarizer for Shouting {
        fn name(&self) -> &str {
            "shouting"
        }

        fn summarize<'a>(&'a self, redacted: &'a str) -> BoxFuture<'a, Result<String>> {
            Box::pin(async move { Ok(format!("• {}", redacted.replace("born", "BORN"))) })
        }
    }

    fn app(summarizer: bool) -> Router {
        let summarizer: Option<Arc<dyn Summarizer>> = if summarizer {
            Some(Arc::new(Shouting))
        } else {
            None
        };
        build_router(Arc::new(AppState::with_summarizer(
            CloakConfig::default(),
            summarizer,
        )))
    }

    async fn call(
        app: Router,
        method: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    const CASE: &str = "John Smith was born on 10/05/1985 and works at XYZ Corporation.";

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app(false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["summarizer"], false);
        assert_eq!(json["languages"][0], "en");
    }

    #[tokio::test]
    async fn test_detect_route() {
        let (status, json) =
            call(app(false), "POST", "/detect", serde_json::json!({ "text": CASE })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 3);
        assert_eq!(json["spans"][0]["label"], "PERSON");
        assert_eq!(json["spans"][0]["text"], "John Smith");
    }

    #[tokio::test]
    async fn test_anonymize_then_restore() {
        let (status, anonymized) =
            call(app(false), "POST", "/anonymize", serde_json::json!({ "text": CASE })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            anonymized["redacted"],
            "<PERSON_0> was born on <DATE_1> and works at <ORG_2>."
        );

        let (status, restored) = call(
            app(false),
            "POST",
            "/restore",
            serde_json::json!({
                "text": "• <PERSON_0> works at <ORG_2>.",
                "map": anonymized["map"],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(restored["text"], "• John Smith works at XYZ Corporation.");
        assert_eq!(restored["missing"], serde_json::json!(["<DATE_1>"]));
    }

    #[tokio::test]
    async fn test_restore_rejects_invalid_map() {
        let (status, json) = call(
            app(false),
            "POST",
            "/restore",
            serde_json::json!({
                "text": "<PERSON_0>",
                "map": [
                    { "placeholder": "<PERSON_0>", "original": "A", "label": "PERSON" },
                    { "placeholder": "<PERSON_0>", "original": "B", "label": "PERSON" },
                ],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["stage"], "restoration");
    }

    #[tokio::test]
    async fn test_restore_rejects_chained_map() {
        let (status, json) = call(
            app(false),
            "POST",
            "/restore",
            serde_json::json!({
                "text": "<X_0>",
                "map": [
                    { "placeholder": "<X_0>", "original": "<X_1>", "label": "X" },
                    { "placeholder": "<X_1>", "original": "Ann", "label": "X" },
                ],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["stage"], "restoration");
    }

    #[tokio::test]
    async fn test_errors_carry_stage() {
        let (status, json) =
            call(app(false), "POST", "/anonymize", serde_json::json!({ "text": "" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["stage"], "detection");

        let (status, json) = call(
            app(false),
            "POST",
            "/detect",
            serde_json::json!({ "text": CASE, "language": "fr" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["retryable"], false);
    }

    #[tokio::test]
    async fn test_summarize_route() {
        let (status, json) =
            call(app(true), "POST", "/summarize", serde_json::json!({ "text": CASE })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["summary"],
            "• John Smith was BORN on 10/05/1985 and works at XYZ Corporation."
        );
        assert_eq!(json["entityCount"], 3);
        assert_eq!(json["attempts"], 1);
    }

    #[tokio::test]
    async fn test_summarize_without_provider() {
        let (status, json) =
            call(app(false), "POST", "/summarize", serde_json::json!({ "text": CASE })).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(json["error"].as_str().unwrap().contains("No LLM provider"));
    }
}
