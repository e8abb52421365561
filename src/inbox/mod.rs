mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use services::{Clarification, InboxError, InboxService};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::thing_routes()
}
