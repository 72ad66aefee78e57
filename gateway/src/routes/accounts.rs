//! Account lookup, creation and history.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;

use crate::dto::{AccountQuery, AccountView, CreateAccountRequest, HistoryQuery, HistoryResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/account?account_id=`
pub async fn get_account(
    State(state): State<AppState>,
    query: Result<Query<AccountQuery>, QueryRejection>,
) -> Result<Json<AccountView>, ApiError> {
    let Query(query) = query?;
    let account = state.engine.get_account(&query.account_id()?).await?;
    Ok(Json(account.into()))
}

/// `POST /api/account`
pub async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountView>), ApiError> {
    let Json(request) = payload?;
    let account_id = request.id.into_account_id()?;

    let account = state
        .engine
        .create_account(&account_id, request.initial_balance.unwrap_or(Decimal::ZERO))
        .await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// `GET /api/transactions?account_id=&limit=`
pub async fn transactions(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Query(query) = query?;
    let account_id = AccountQuery {
        account_id: query.account_id,
    }
    .account_id()?;

    let transactions = state.engine.transactions(&account_id, query.limit).await?;
    Ok(Json(HistoryResponse {
        transactions: transactions.into_iter().map(Into::into).collect(),
    }))
}
