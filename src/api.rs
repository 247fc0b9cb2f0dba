//! HTTP surface: `POST /api/v1/evaluate` and `GET /health`

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::EvalError;
use crate::models::{EvaluationOutcome, EvaluationRequest};
use crate::runner::Runner;

/// Shared handler state
#[derive(Clone)]
struct AppState {
    runner: Arc<Runner>,
}

/// Build the service router around a shared runner
pub fn router(runner: Arc<Runner>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/evaluate", post(evaluate_handler))
        .with_state(AppState { runner })
        .layer(TraceLayer::new_for_http())
}

/// Serve until Ctrl-C
pub async fn serve(runner: Arc<Runner>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("summary evaluation API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(runner))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn evaluate_handler(
    State(state): State<AppState>,
    payload: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Result<Json<EvaluationOutcome>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected request body");
        ApiError::new(rejection.status(), rejection.body_text())
    })?;

    info!(
        parameters = ?request.evaluation_parameters,
        transcript_chars = request.transcript.chars().count(),
        summary_chars = request.summary.chars().count(),
        "evaluation request received"
    );

    let outcome = state.runner.run(&request).await?;
    Ok(Json(outcome))
}

/// Error response carrying `{"detail": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<EvalError> for ApiError {
    fn from(err: EvalError) -> Self {
        let status = match &err {
            EvalError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EvalError::NoValidParameters => StatusCode::BAD_REQUEST,
            EvalError::EvaluationFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            EvalError::Provider(_) | EvalError::MalformedResponse(_) | EvalError::ScoreOutOfRange(_) => {
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.");
            }
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::tests::{RoutingJudge, test_config};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const GOOD: &str = r#"{"score": 8.5, "explanation": "The summary covers the main points well."}"#;

    fn app(judge: RoutingJudge) -> Router {
        router(Arc::new(Runner::new(Arc::new(test_config()), Arc::new(judge))))
    }

    async fn post_json(app: Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/evaluate")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(RoutingJudge::new(&[]))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_evaluate_summary_success() {
        let judge = RoutingJudge::new(&[("coverage", Ok(GOOD)), ("clarity", Ok(GOOD))]);
        let (status, body) = post_json(
            app(judge),
            json!({
                "transcript": "This is the full long transcript about AI.",
                "summary": "This is a short summary.",
                "evaluation_parameters": ["coverage", "clarity"]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!((body["final_score"].as_f64().unwrap() - 8.5).abs() < 1e-6);
        assert!(body["explanation"].as_str().unwrap().starts_with("Overall assessment:"));
        assert_eq!(body["metric_details"]["coverage"]["score"], 8.5);
        assert_eq!(body["metric_details"].as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_evaluate_summary_invalid_input() {
        let (status, body) = post_json(
            app(RoutingJudge::new(&[])),
            json!({"transcript": "", "summary": "This is a summary."}),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("Transcript cannot be empty"));
    }

    #[tokio::test]
    async fn test_evaluate_oversized_summary() {
        let (status, body) = post_json(
            app(RoutingJudge::new(&[])),
            json!({"transcript": "Valid transcript.", "summary": "s".repeat(51)}),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("maximum of 50 characters"));
    }

    #[tokio::test]
    async fn test_evaluate_missing_field() {
        let (status, body) = post_json(app(RoutingJudge::new(&[])), json!({"summary": "Only a summary."})).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("transcript"));
    }

    #[tokio::test]
    async fn test_evaluate_llm_error() {
        let judge = RoutingJudge::new(&[("coverage", Err("LLM API is down"))]);
        let (status, body) = post_json(
            app(judge),
            json!({
                "transcript": "This is a valid transcript.",
                "summary": "This is a valid summary.",
                "evaluation_parameters": ["coverage"]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.contains("An error occurred while evaluating 'coverage'"));
        assert!(!detail.contains("LLM API is down"));
        assert!(body.get("metric_details").is_none());
    }

    #[tokio::test]
    async fn test_evaluate_no_known_parameters() {
        let (status, body) = post_json(
            app(RoutingJudge::new(&[])),
            json!({
                "transcript": "This is a valid transcript.",
                "summary": "This is a valid summary.",
                "evaluation_parameters": ["fluency", "tone"]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "No valid evaluation parameters were processed.");
    }
}
