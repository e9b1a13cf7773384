//! API routes module
//!
//! Defines all HTTP API routes for the user registry.

pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Create all API routes.
///
/// Merged at the application root so the user endpoints keep their
/// original paths (`/user`, `/users`, `/user/{username}`).
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .merge(users::router(state))
        .merge(health::router(state.clone()))
}
