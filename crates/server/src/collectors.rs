//! Debt collector endpoints.

use api_types::{
    Range,
    collector::{CollectorNew, CollectorUpdate},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{CollectorReport, DebtCollector, PurchaseSummary, User};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Json(payload): Json<CollectorNew>,
) -> Result<(StatusCode, Json<DebtCollector>), ServerError> {
    let collector = state
        .engine
        .create_collector(
            &slug,
            &payload.username,
            &payload.name,
            payload.phone.as_deref(),
            &user.username,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(collector)))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<DebtCollector>>, ServerError> {
    Ok(Json(
        state
            .engine
            .list_collectors(&slug, &user.username)
            .await?,
    ))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Json(payload): Json<CollectorUpdate>,
) -> Result<Json<DebtCollector>, ServerError> {
    Ok(Json(
        state
            .engine
            .set_collector_active(&slug, id, payload.active, &user.username)
            .await?,
    ))
}

/// Open purchases assigned to the calling collector.
pub async fn my_purchases(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<PurchaseSummary>>, ServerError> {
    Ok(Json(
        state
            .engine
            .collector_purchases(&slug, &user.username)
            .await?,
    ))
}

pub async fn report(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Query(range): Query<Range>,
) -> Result<Json<CollectorReport>, ServerError> {
    let report = state
        .engine
        .collector_report(
            &slug,
            id,
            range.from.map(|dt| dt.with_timezone(&Utc)),
            range.to.map(|dt| dt.with_timezone(&Utc)),
            &user.username,
        )
        .await?;
    Ok(Json(report))
}
