use axum::{Router, routing::get};

use crate::state::AppState;

pub mod doc;
pub mod graphql;
pub mod health;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route(
            "/graphql",
            get(graphql::graphiql).post(graphql::graphql_handler),
        )
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness))
}
