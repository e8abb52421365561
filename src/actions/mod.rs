mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use services::{ActionError, ActionService, ClarifiedData};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::action_routes()
}
