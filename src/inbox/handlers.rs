use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    actions::repo_types::Action,
    auth::extractors::AuthUser,
    error::AppError,
    inbox::{
        dto::{CaptureRequest, ClarifyRequest},
        repo_types::Thing,
    },
    state::AppState,
};

pub fn thing_routes() -> Router<AppState> {
    Router::new()
        .route("/things", get(list_things).post(capture_thing))
        .route("/things/:id", get(get_thing))
        .route("/things/:id/clarify", post(clarify_thing))
}

#[instrument(skip(state))]
pub async fn list_things(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<Thing>>, AppError> {
    Ok(Json(state.inbox.list(claims.user_id).await?))
}

#[instrument(skip(state, body))]
pub async fn capture_thing(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(body): Json<CaptureRequest>,
) -> Result<(StatusCode, Json<Thing>), AppError> {
    let thing = state
        .inbox
        .add(claims.user_id, &body.title, &body.description)
        .await?;
    Ok((StatusCode::CREATED, Json(thing)))
}

#[instrument(skip(state))]
pub async fn get_thing(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Thing>, AppError> {
    Ok(Json(state.inbox.get(claims.user_id, id).await?))
}

#[instrument(skip(state, body))]
pub async fn clarify_thing(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<(StatusCode, Json<Action>), AppError> {
    let request = parse_clarify_body(&body)?;
    let action = state
        .inbox
        .clarify(claims.user_id, id, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(action)))
}

/// An empty body means "no overrides"; anything else must be a valid request.
fn parse_clarify_body(body: &[u8]) -> Result<ClarifyRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ClarifyRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "malformed clarify body");
        AppError::Validation(format!("Invalid clarify request: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_clarify_body_means_defaults() {
        for body in [&b""[..], b"  \n"] {
            let request = parse_clarify_body(body).unwrap();
            assert!(request.priority.is_none());
            assert!(request.title.is_none());
        }
    }

    #[test]
    fn malformed_clarify_body_is_rejected() {
        for body in [&br#"{"priority": 5}"#[..], b"{not json", br#""low""#] {
            let err = parse_clarify_body(body).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[test]
    fn clarify_body_fields_are_read() {
        let request = parse_clarify_body(br#"{"priority":"low","title":"t"}"#).unwrap();
        assert_eq!(request.priority.as_deref(), Some("low"));
        assert_eq!(request.title.as_deref(), Some("t"));
    }
}
