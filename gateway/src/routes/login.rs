//! `POST /api/login`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::{info, warn};

use smallbank_common::LedgerError;

use crate::dto::{LoginRequest, LoginResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;

    if !state.credentials.verify(&request.username, &request.password) {
        state.metrics.auth_failed();
        warn!(username = %request.username, "Login rejected");
        return Err(LedgerError::Forbidden("Invalid credentials".to_string()).into());
    }

    let token = state.tokens.issue(&request.username).map_err(LedgerError::from)?;
    state.metrics.login_succeeded();
    info!(username = %request.username, "Login succeeded");

    Ok(Json(LoginResponse { token }))
}
