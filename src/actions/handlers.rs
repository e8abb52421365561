use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;

use crate::{
    actions::{dto::CreateActionRequest, repo_types::{Action, NewAction}},
    auth::extractors::AuthUser,
    error::AppError,
    state::AppState,
};

pub fn action_routes() -> Router<AppState> {
    Router::new().route("/actions", get(list_actions).post(create_action))
}

#[instrument(skip(state))]
pub async fn list_actions(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<Action>>, AppError> {
    let actions = state.actions.list(claims.user_id).await?;
    Ok(Json(actions))
}

#[instrument(skip(state, body))]
pub async fn create_action(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(body): Json<CreateActionRequest>,
) -> Result<(StatusCode, Json<Action>), AppError> {
    let action = state
        .actions
        .create(NewAction {
            owner_id: claims.user_id,
            title: body.title,
            description: body.description,
            due_date: body.due_date,
            context: body.context,
            source_thing_id: None,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(action)))
}
