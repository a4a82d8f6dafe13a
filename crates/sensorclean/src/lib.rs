pub mod batch;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

pub use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/clean", post(routes::clean))
        .route("/health", get(routes::health))
        .with_state(state)
}
