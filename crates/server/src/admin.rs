//! Platform administration endpoints. Every handler requires a super-admin;
//! the engine enforces it.

use api_types::{business::BusinessActive, subscription::SubscriptionSet, ticket::TicketList};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Business, PlatformAnalytics, Subscription, Ticket, User};

use crate::{ServerError, server::ServerState, wire};

pub async fn businesses(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Business>>, ServerError> {
    Ok(Json(state.engine.list_all_businesses(&user.username).await?))
}

pub async fn set_business_active(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Json(payload): Json<BusinessActive>,
) -> Result<Json<Business>, ServerError> {
    Ok(Json(
        state
            .engine
            .set_business_active(&slug, payload.active, &user.username)
            .await?,
    ))
}

pub async fn set_subscription(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Json(payload): Json<SubscriptionSet>,
) -> Result<(StatusCode, Json<Subscription>), ServerError> {
    let subscription = state
        .engine
        .set_subscription(
            &slug,
            wire(payload.plan.as_str())?,
            payload.months,
            payload.amount_minor,
            &user.username,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn cancel_subscription(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> Result<Json<Subscription>, ServerError> {
    Ok(Json(
        state
            .engine
            .cancel_subscription(&slug, &user.username)
            .await?,
    ))
}

pub async fn tickets(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<TicketList>,
) -> Result<Json<Vec<Ticket>>, ServerError> {
    let status = query.status.map(|s| wire(s.as_str())).transpose()?;
    Ok(Json(
        state
            .engine
            .list_all_tickets(status, &user.username)
            .await?,
    ))
}

pub async fn analytics(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<PlatformAnalytics>, ServerError> {
    Ok(Json(state.engine.platform_analytics(&user.username).await?))
}
