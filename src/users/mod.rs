pub mod dto;
pub mod handlers;
#[cfg(test)]
pub mod memory;
mod password;
mod phone;
mod presenter;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod validation;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::user_routes())
}
