//! Customer wallet endpoints.

use api_types::{
    Reason,
    wallet::{DepositNew, WalletGet, WithdrawalNew},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{User, WalletTransaction, WalletView};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Query(query): Query<WalletGet>,
) -> Result<Json<WalletView>, ServerError> {
    let wallet = state
        .engine
        .wallet(&slug, id, query.limit.unwrap_or(50), &user.username)
        .await?;
    Ok(Json(wallet))
}

/// Deposits wait for confirmation before the balance moves.
pub async fn deposit(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Json(payload): Json<DepositNew>,
) -> Result<(StatusCode, Json<WalletTransaction>), ServerError> {
    let tx = state
        .engine
        .deposit(
            &slug,
            id,
            payload.amount_minor,
            payload.reference.as_deref(),
            payload.note.as_deref(),
            &user.username,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn withdraw(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Json(payload): Json<WithdrawalNew>,
) -> Result<(StatusCode, Json<WalletTransaction>), ServerError> {
    let tx = state
        .engine
        .withdraw(
            &slug,
            id,
            payload.amount_minor,
            payload.note.as_deref(),
            &user.username,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn pending(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<WalletTransaction>>, ServerError> {
    Ok(Json(
        state
            .engine
            .pending_deposits(&slug, &user.username)
            .await?,
    ))
}

pub async fn confirm(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, tx_id)): Path<(String, Uuid)>,
) -> Result<Json<WalletTransaction>, ServerError> {
    Ok(Json(
        state
            .engine
            .confirm_deposit(&slug, tx_id, &user.username)
            .await?,
    ))
}

pub async fn reject(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, tx_id)): Path<(String, Uuid)>,
    Json(payload): Json<Reason>,
) -> Result<Json<WalletTransaction>, ServerError> {
    Ok(Json(
        state
            .engine
            .reject_deposit(&slug, tx_id, &payload.reason, &user.username)
            .await?,
    ))
}
