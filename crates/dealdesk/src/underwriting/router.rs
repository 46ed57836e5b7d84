use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::DealId;
use super::repository::{DealRepository, NotificationPublisher, RepositoryError};
use super::service::{OfferRequest, UnderwritingService, UnderwritingServiceError};
use super::stage::DecisionRequest;

const DEFAULT_ACTOR: &str = "underwriting-desk";

/// Router builder exposing the three boundary operations plus a status
/// snapshot. Authentication and persistence sit outside this crate.
pub fn underwriting_router<R, N>(service: Arc<UnderwritingService<R, N>>) -> Router
where
    R: DealRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/deals/:deal_id/analyze",
            post(analyze_handler::<R, N>),
        )
        .route("/api/v1/deals/:deal_id/offer", post(offer_handler::<R, N>))
        .route(
            "/api/v1/deals/:deal_id/decision",
            post(decision_handler::<R, N>),
        )
        .route("/api/v1/deals/:deal_id", get(status_handler::<R, N>))
        .with_state(service)
}

/// Decision payload with the acting underwriter alongside the decision
/// fields proper.
#[derive(Debug, Deserialize)]
pub(crate) struct DecisionBody {
    pub(crate) underwriter: Option<String>,
    #[serde(flatten)]
    pub(crate) request: DecisionRequest,
}

pub(crate) async fn analyze_handler<R, N>(
    State(service): State<Arc<UnderwritingService<R, N>>>,
    Path(deal_id): Path<String>,
) -> Response
where
    R: DealRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.analyze(&DealId(deal_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn offer_handler<R, N>(
    State(service): State<Arc<UnderwritingService<R, N>>>,
    Path(deal_id): Path<String>,
    axum::Json(request): axum::Json<OfferRequest>,
) -> Response
where
    R: DealRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.offer(&DealId(deal_id), &request) {
        Ok(sheet) => (StatusCode::OK, axum::Json(sheet)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decision_handler<R, N>(
    State(service): State<Arc<UnderwritingService<R, N>>>,
    Path(deal_id): Path<String>,
    axum::Json(body): axum::Json<DecisionBody>,
) -> Response
where
    R: DealRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = body.underwriter.as_deref().unwrap_or(DEFAULT_ACTOR);
    match service.decide(&DealId(deal_id), actor, &body.request) {
        Ok(outcome) => {
            let payload = json!({
                "deal": outcome.deal.status_view(),
                "message": outcome.message,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, N>(
    State(service): State<Arc<UnderwritingService<R, N>>>,
    Path(deal_id): Path<String>,
) -> Response
where
    R: DealRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get(&DealId(deal_id)) {
        Ok(bundle) => (StatusCode::OK, axum::Json(bundle.deal.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: UnderwritingServiceError) -> Response {
    let status = match &error {
        UnderwritingServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        UnderwritingServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        UnderwritingServiceError::Repository(RepositoryError::Unavailable(_))
        | UnderwritingServiceError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        UnderwritingServiceError::MissingRevenue { .. }
        | UnderwritingServiceError::Transition(_)
        | UnderwritingServiceError::Scoring(_)
        | UnderwritingServiceError::Offer(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
