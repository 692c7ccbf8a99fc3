use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::domain::{Actor, ActorRole, ProjectId};
use super::edit_requests::domain::{EditRequestDraft, RequestId};
use super::edit_requests::service::{EditRequestService, WorkflowError};
use super::report;
use super::status::StatusEngine;
use super::store::{EntityStore, ReviewNotifier, StoreError};

/// Shared router state: the store for reads, the service for workflow
/// mutations, and the derivation engine.
pub struct PipelineState<S, N> {
    store: Arc<S>,
    service: Arc<EditRequestService<S, N>>,
    engine: StatusEngine,
}

impl<S, N> Clone for PipelineState<S, N> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            service: Arc::clone(&self.service),
            engine: self.engine.clone(),
        }
    }
}

/// Router builder exposing the pipeline listing, status, and edit request
/// endpoints.
pub fn pipeline_router<S, N>(store: Arc<S>, notifier: Arc<N>, engine: StatusEngine) -> Router
where
    S: EntityStore + 'static,
    N: ReviewNotifier + 'static,
{
    let state = PipelineState {
        service: Arc::new(EditRequestService::new(store.clone(), notifier)),
        store,
        engine,
    };

    Router::new()
        .route(
            "/api/v1/pipeline/projects",
            get(list_projects_handler::<S, N>),
        )
        .route(
            "/api/v1/pipeline/projects/:project_id/status",
            get(project_status_handler::<S, N>),
        )
        .route(
            "/api/v1/pipeline/status-counts",
            get(status_counts_handler::<S, N>),
        )
        .route(
            "/api/v1/pipeline/edit-requests",
            post(create_request_handler::<S, N>).get(pending_requests_handler::<S, N>),
        )
        .route(
            "/api/v1/pipeline/edit-requests/:request_id/approve",
            post(approve_handler::<S, N>),
        )
        .route(
            "/api/v1/pipeline/edit-requests/:request_id/reject",
            post(reject_handler::<S, N>),
        )
        .route(
            "/api/v1/pipeline/edit-requests/:request_id/withdraw",
            post(withdraw_handler::<S, N>),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ViewerQuery {
    name: String,
    role: ActorRole,
    #[serde(default)]
    user_id: Option<String>,
}

impl ViewerQuery {
    fn actor(self) -> Actor {
        let user_id = self.user_id.unwrap_or_else(|| self.name.clone());
        Actor {
            user_id,
            name: self.name,
            role: self.role,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReviewDecision {
    reviewer_id: String,
    #[serde(default)]
    comment: Option<String>,
}

async fn list_projects_handler<S, N>(
    State(state): State<PipelineState<S, N>>,
    Query(viewer): Query<ViewerQuery>,
) -> Response
where
    S: EntityStore + 'static,
    N: ReviewNotifier + 'static,
{
    let actor = viewer.actor();
    let today = Local::now().date_naive();
    match report::visible_projects(state.store.as_ref(), &state.engine, &actor, today) {
        Ok(projects) => (StatusCode::OK, axum::Json(projects)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn project_status_handler<S, N>(
    State(state): State<PipelineState<S, N>>,
    Path(project_id): Path<String>,
) -> Response
where
    S: EntityStore + 'static,
    N: ReviewNotifier + 'static,
{
    let id = ProjectId(project_id);
    let project = match state.store.project(&id) {
        Ok(Some(project)) => project,
        Ok(None) => {
            let payload = json!({ "error": format!("project {} not found", id.0) });
            return (StatusCode::NOT_FOUND, axum::Json(payload)).into_response();
        }
        Err(err) => return store_error_response(err),
    };

    let (segments, pois) = match (state.store.segments(), state.store.pois()) {
        (Ok(segments), Ok(pois)) => (segments, pois),
        (Err(err), _) | (_, Err(err)) => return store_error_response(err),
    };

    let today = Local::now().date_naive();
    let info = state.engine.derive(&project, &segments, &pois, today);
    (StatusCode::OK, axum::Json(info)).into_response()
}

async fn status_counts_handler<S, N>(State(state): State<PipelineState<S, N>>) -> Response
where
    S: EntityStore + 'static,
    N: ReviewNotifier + 'static,
{
    let today = Local::now().date_naive();
    match report::status_board(state.store.as_ref(), &state.engine, today) {
        Ok(counts) => (StatusCode::OK, axum::Json(counts)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn create_request_handler<S, N>(
    State(state): State<PipelineState<S, N>>,
    axum::Json(draft): axum::Json<EditRequestDraft>,
) -> Response
where
    S: EntityStore + 'static,
    N: ReviewNotifier + 'static,
{
    match state.service.create(draft) {
        Ok(request) => (StatusCode::CREATED, axum::Json(request)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn pending_requests_handler<S, N>(State(state): State<PipelineState<S, N>>) -> Response
where
    S: EntityStore + 'static,
    N: ReviewNotifier + 'static,
{
    match state.service.pending() {
        Ok(requests) => (StatusCode::OK, axum::Json(requests)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn approve_handler<S, N>(
    State(state): State<PipelineState<S, N>>,
    Path(request_id): Path<String>,
    axum::Json(decision): axum::Json<ReviewDecision>,
) -> Response
where
    S: EntityStore + 'static,
    N: ReviewNotifier + 'static,
{
    let id = RequestId(request_id);
    match state
        .service
        .approve(&id, &decision.reviewer_id, decision.comment)
    {
        Ok(request) => (StatusCode::OK, axum::Json(request)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn reject_handler<S, N>(
    State(state): State<PipelineState<S, N>>,
    Path(request_id): Path<String>,
    axum::Json(decision): axum::Json<ReviewDecision>,
) -> Response
where
    S: EntityStore + 'static,
    N: ReviewNotifier + 'static,
{
    let id = RequestId(request_id);
    let comment = decision.comment.unwrap_or_default();
    match state.service.reject(&id, &decision.reviewer_id, &comment) {
        Ok(request) => (StatusCode::OK, axum::Json(request)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn withdraw_handler<S, N>(
    State(state): State<PipelineState<S, N>>,
    Path(request_id): Path<String>,
) -> Response
where
    S: EntityStore + 'static,
    N: ReviewNotifier + 'static,
{
    let id = RequestId(request_id);
    match state.service.withdraw(&id) {
        Ok(request) => (StatusCode::OK, axum::Json(request)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

fn workflow_error_response(error: WorkflowError) -> Response {
    let status = match &error {
        WorkflowError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
        WorkflowError::InvalidState { .. } => StatusCode::CONFLICT,
        WorkflowError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        WorkflowError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        WorkflowError::Store(StoreError::Unavailable(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn store_error_response(error: StoreError) -> Response {
    let status = match &error {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Conflict => StatusCode::CONFLICT,
        StoreError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
