//! Balance queries, money movements and reset.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};
use tracing::info;

use smallbank_common::{Amount, LedgerError};

use crate::auth::Claims;
use crate::dto::{AccountQuery, BalanceResponse, EventRequest, EventResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/balance?account_id=`
pub async fn balance(
    State(state): State<AppState>,
    query: Result<Query<AccountQuery>, QueryRejection>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let Query(query) = query?;
    let account_id = query.account_id()?;

    let balance = state.engine.get_balance(&account_id).await?;
    Ok(Json(BalanceResponse { balance }))
}

/// `POST /api/event`
pub async fn event(
    State(state): State<AppState>,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let Json(request) = payload?;

    match apply(&state, request).await {
        Ok(response) => Ok((StatusCode::CREATED, Json(response))),
        Err(e) => {
            state.metrics.operation_error(&e);
            Err(e.into())
        }
    }
}

async fn apply(state: &AppState, request: EventRequest) -> Result<EventResponse, LedgerError> {
    let engine = &state.engine;

    match request {
        EventRequest::Deposit {
            destination,
            amount,
        } => {
            let destination = destination.into_account_id()?;
            let outcome = engine.deposit(&destination, Amount::new(amount)?).await?;
            state.metrics.deposit_applied();
            Ok(EventResponse {
                destination: Some(outcome.destination.into()),
                ..EventResponse::default()
            })
        }
        EventRequest::Withdraw { origin, amount } => {
            let origin = origin.into_account_id()?;
            let outcome = engine.withdraw(&origin, Amount::new(amount)?).await?;
            state.metrics.withdrawal_applied();
            Ok(EventResponse {
                origin: Some(outcome.origin.into()),
                ..EventResponse::default()
            })
        }
        EventRequest::Transfer {
            origin,
            destination,
            amount,
        } => {
            let origin = origin.into_account_id()?;
            let destination = destination.into_account_id()?;
            let outcome = engine
                .transfer(&origin, &destination, Amount::new(amount)?)
                .await?;
            state.metrics.transfer_applied();
            Ok(EventResponse {
                origin: Some(outcome.origin.into()),
                destination: Some(outcome.destination.into()),
            })
        }
    }
}

/// `POST /api/reset`
pub async fn reset(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    state.engine.reset().await?;
    info!(user = %claims.sub, "Ledger reset requested");
    Ok(Json(json!({})))
}
