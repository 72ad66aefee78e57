//! SmallBank Gateway
//!
//! Authenticated HTTP+JSON API over the ledger engine.

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use state::AppState;

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/balance", get(routes::events::balance))
        .route("/event", post(routes::events::event))
        .route("/reset", post(routes::events::reset))
        .route(
            "/account",
            get(routes::accounts::get_account).post(routes::accounts::create_account),
        )
        .route("/transactions", get(routes::accounts::transactions))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth))
        .route("/login", post(routes::login::login));

    Router::new()
        .nest("/api", api)
        .route("/health", get(routes::health::health))
        .route("/metrics", get(routes::health::metrics))
        .with_state(state)
}
