use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{EvaluationRequest, ProfileId, UserId};
use super::repository::{ProfileStore, ProgramCatalog, ResultStore};
use super::service::EligibilityService;

/// Header the thin transport layer reads the authenticated caller from.
/// Credential checking itself is owned by an upstream gateway.
const USER_HEADER: &str = "x-user-id";

/// Router builder exposing the evaluation boundary over HTTP.
pub fn eligibility_router<C, P, S>(service: Arc<EligibilityService<C, P, S>>) -> Router
where
    C: ProgramCatalog + 'static,
    P: ProfileStore + 'static,
    S: ResultStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/eligibility/evaluate",
            post(evaluate_handler::<C, P, S>),
        )
        .route(
            "/api/v1/eligibility/results/:profile_id",
            get(stored_results_handler::<C, P, S>),
        )
        .with_state(service)
}

pub(crate) async fn evaluate_handler<C, P, S>(
    State(service): State<Arc<EligibilityService<C, P, S>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<EvaluationRequest>,
) -> Response
where
    C: ProgramCatalog + 'static,
    P: ProfileStore + 'static,
    S: ResultStore + 'static,
{
    let caller = caller_identity(&headers);

    match service.evaluate(caller.as_ref(), &request) {
        Ok(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (error.status_code(), axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn stored_results_handler<C, P, S>(
    State(service): State<Arc<EligibilityService<C, P, S>>>,
    Path(profile_id): Path<String>,
) -> Response
where
    C: ProgramCatalog + 'static,
    P: ProfileStore + 'static,
    S: ResultStore + 'static,
{
    let id = ProfileId(profile_id);
    match service.stored_results(&id) {
        Ok(rows) => (StatusCode::OK, axum::Json(rows)).into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (error.status_code(), axum::Json(payload)).into_response()
        }
    }
}

fn caller_identity(headers: &HeaderMap) -> Option<UserId> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| UserId(value.to_string()))
}
