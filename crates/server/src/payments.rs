//! Payment endpoints.

use api_types::{
    Reason,
    purchase::{PaymentNew, PendingPayments},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Payment, PaymentCmd, User};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, wire};

/// Records a payment against a purchase. Debt collectors' payments stay
/// pending until confirmed.
pub async fn record(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Json(payload): Json<PaymentNew>,
) -> Result<(StatusCode, Json<Payment>), ServerError> {
    let mut cmd = PaymentCmd::new(id, payload.amount_minor, wire(payload.method.as_str())?);
    cmd.reference = payload.reference;
    cmd.note = payload.note;

    let payment = state
        .engine
        .record_payment(&slug, cmd, &user.username)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn pending(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Query(query): Query<PendingPayments>,
) -> Result<Json<Vec<Payment>>, ServerError> {
    Ok(Json(
        state
            .engine
            .pending_payments(&slug, query.shop.as_deref(), &user.username)
            .await?,
    ))
}

pub async fn confirm(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<Json<Payment>, ServerError> {
    Ok(Json(
        state
            .engine
            .confirm_payment(&slug, id, &user.username)
            .await?,
    ))
}

pub async fn reject(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Json(payload): Json<Reason>,
) -> Result<Json<Payment>, ServerError> {
    Ok(Json(
        state
            .engine
            .reject_payment(&slug, id, &payload.reason, &user.username)
            .await?,
    ))
}
