use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use expense_core::{EstimateResponse, RawSelection};
use expense_estimator::{
    EstimateOutcome, EstimatorConfig, ExpenseEstimator, FormView, SubmissionFailure,
};
use expense_ml::{InferenceError, PredictionError};
use expense_observability::{AppMetrics, MetricsSnapshot};
use serde::Serialize;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub estimator: Arc<ExpenseEstimator>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    model_backend: &'static str,
    model_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_error: Option<String>,
    catalog_issues: Vec<String>,
    metrics: MetricsSnapshot,
}

pub fn build_app(config: &EstimatorConfig) -> Router {
    let estimator = ExpenseEstimator::load(config, AppMetrics::shared());
    build_router(ApiState {
        estimator: Arc::new(estimator),
    })
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/form", get(form))
        .route("/v1/estimate", post(estimate))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let estimator = &state.estimator;
    let degraded = !estimator.model_available() || !estimator.catalog_warnings().is_empty();

    let payload = HealthResponse {
        status: if degraded { "degraded" } else { "ok" },
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        model_backend: estimator.backend(),
        model_available: estimator.model_available(),
        model_error: estimator.model_error().map(ToString::to_string),
        catalog_issues: estimator.catalog_warnings().to_vec(),
        metrics: estimator.metrics().snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn form(State(state): State<ApiState>) -> Json<FormView> {
    Json(state.estimator.form())
}

async fn estimate(
    State(state): State<ApiState>,
    body: Result<Json<RawSelection>, JsonRejection>,
) -> impl IntoResponse {
    let raw = match body {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "unreadable submission body");
            return (
                rejection.status(),
                Json(EstimateResponse::error(format!(
                    "Invalid submission: {}",
                    rejection.body_text()
                ))),
            );
        }
    };

    let outcome = state.estimator.submit(raw);
    let status = status_for(&outcome);
    (status, Json(outcome.into_response()))
}

fn status_for(outcome: &EstimateOutcome) -> StatusCode {
    match outcome {
        EstimateOutcome::Succeeded { .. } => StatusCode::OK,
        EstimateOutcome::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EstimateOutcome::Failed(SubmissionFailure::Prediction(
            PredictionError::Transform(InferenceError::Unavailable(_))
            | PredictionError::Predict(InferenceError::Unavailable(_)),
        )) => StatusCode::SERVICE_UNAVAILABLE,
        EstimateOutcome::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use expense_core::{RowBuildError, ValidationError};
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn maps_outcomes_to_status_codes() {
        assert_eq!(
            status_for(&EstimateOutcome::Succeeded {
                estimate: 1.0,
                clamped: false
            }),
            StatusCode::OK
        );
        assert_eq!(
            status_for(&EstimateOutcome::Rejected(
                ValidationError::IncompleteSelection {
                    fields: BTreeSet::new()
                }
            )),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&EstimateOutcome::Failed(SubmissionFailure::RowBuild(
                RowBuildError::UnknownFlightClass("Premium".to_string())
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&EstimateOutcome::Failed(SubmissionFailure::Prediction(
                PredictionError::Transform(InferenceError::Unavailable("gone".to_string()))
            ))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
