use axum::{
    extract::{Path, State},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};

use crate::app::AppState;
use crate::auth::ActingUser;
use crate::discussions::params::DiscussionForm;
use crate::error::ApiError;
use crate::middleware::acting_user_middleware;
use crate::pipeline::{Outcome, StageRequest};
use crate::types::Action;

/// Discussion resource routes, behind the acting-user middleware
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/discussions", get(discussion_index))
        .route("/discussions/new", get(discussion_new))
        .route("/discussions/create", post(discussion_create))
        .route("/discussions/:id", get(discussion_show))
        .route("/discussions/:id/edit", get(discussion_edit))
        .route("/discussions/:id/update", put(discussion_update))
        .route("/discussions/:id/delete", delete(discussion_delete))
        .route_layer(middleware::from_fn_with_state(state, acting_user_middleware))
}

/// GET /discussions - list every discussion with its author
pub async fn discussion_index(State(state): State<AppState>) -> Result<Response, ApiError> {
    dispatch(&state, Action::Index, StageRequest::new()).await
}

/// GET /discussions/new - blank form page
pub async fn discussion_new(State(state): State<AppState>) -> Result<Response, ApiError> {
    dispatch(&state, Action::New, StageRequest::new()).await
}

/// POST /discussions/create
pub async fn discussion_create(
    State(state): State<AppState>,
    user: Option<Extension<ActingUser>>,
    Json(form): Json<DiscussionForm>,
) -> Result<Response, ApiError> {
    let req = StageRequest::new()
        .with_form(form)
        .with_user(user.map(|Extension(user)| user));
    dispatch(&state, Action::Create, req).await
}

/// GET /discussions/:id - details page; counts a view
pub async fn discussion_show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    dispatch(&state, Action::Show, StageRequest::new().with_id(id)).await
}

/// GET /discussions/:id/edit
pub async fn discussion_edit(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    dispatch(&state, Action::Edit, StageRequest::new().with_id(id)).await
}

/// PUT /discussions/:id/update
pub async fn discussion_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<Extension<ActingUser>>,
    Json(form): Json<DiscussionForm>,
) -> Result<Response, ApiError> {
    let req = StageRequest::new()
        .with_id(id)
        .with_form(form)
        .with_user(user.map(|Extension(user)| user));
    dispatch(&state, Action::Update, req).await
}

/// DELETE /discussions/:id/delete
pub async fn discussion_delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    dispatch(&state, Action::Delete, StageRequest::new().with_id(id)).await
}

async fn dispatch(state: &AppState, action: Action, req: StageRequest) -> Result<Response, ApiError> {
    tracing::info!("Handling {} request (id: {:?})", action, req.id);
    let outcome = state.pipelines.get(action).run(req).await?;
    respond(outcome)
}

fn respond(outcome: Outcome) -> Result<Response, ApiError> {
    match outcome {
        Outcome::Redirect(path) => Ok(Redirect::to(&path).into_response()),
        Outcome::Render(rendered) => Ok(rendered.into_response()),
        Outcome::Unhandled => Err(ApiError::not_found("No handler produced a response")),
    }
}
