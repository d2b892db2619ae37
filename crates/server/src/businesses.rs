//! Businesses, members, subscription and dashboard endpoints.

use api_types::{
    business::{BusinessNew, BusinessUpdate, DashboardQuery, StatusRefresh},
    membership::MemberUpsert,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{
    Access, Business, BusinessDashboard, BusinessPatch, Currency, Member, NewBusinessCmd,
    Subscription, User,
};
use serde::Serialize;

use crate::{ServerError, server::ServerState, wire};

/// A business as seen by the caller.
#[derive(Serialize)]
pub struct BusinessView {
    #[serde(flatten)]
    pub business: Business,
    pub access: Access,
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<BusinessNew>,
) -> Result<(StatusCode, Json<Business>), ServerError> {
    let mut cmd = NewBusinessCmd::new(payload.name);
    if let Some(currency) = payload.currency {
        cmd = cmd.currency(Currency::try_from(currency.as_str())?);
    }
    cmd.contact.phone = payload.phone;
    cmd.contact.email = payload.email;
    cmd.contact.address = payload.address;

    let business = state.engine.create_business(cmd, &user.username).await?;
    Ok((StatusCode::CREATED, Json(business)))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Business>>, ServerError> {
    Ok(Json(state.engine.list_businesses(&user.username).await?))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> Result<Json<BusinessView>, ServerError> {
    let (business, access) = state.engine.business_by_slug(&slug, &user.username).await?;
    Ok(Json(BusinessView { business, access }))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Json(payload): Json<BusinessUpdate>,
) -> Result<Json<Business>, ServerError> {
    let patch = BusinessPatch {
        name: payload.name,
        phone: payload.phone,
        email: payload.email,
        address: payload.address,
        default_after_days: payload.default_after_days,
    };
    Ok(Json(
        state
            .engine
            .update_business(&slug, patch, &user.username)
            .await?,
    ))
}

pub async fn list_members(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<Member>>, ServerError> {
    Ok(Json(state.engine.list_members(&slug, &user.username).await?))
}

pub async fn upsert_member(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Json(payload): Json<MemberUpsert>,
) -> Result<Json<Member>, ServerError> {
    let member = state
        .engine
        .upsert_member(
            &slug,
            &payload.username,
            wire(payload.role.as_str())?,
            payload.shop_id,
            &user.username,
        )
        .await?;
    Ok(Json(member))
}

pub async fn remove_member(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, username)): Path<(String, String)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_member(&slug, &username, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn subscription(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> Result<Json<Option<Subscription>>, ServerError> {
    Ok(Json(
        state
            .engine
            .current_subscription(&slug, &user.username)
            .await?,
    ))
}

pub async fn dashboard(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<BusinessDashboard>, ServerError> {
    let dashboard = state
        .engine
        .business_dashboard(
            &slug,
            query.shop.as_deref(),
            query.from.map(|dt| dt.with_timezone(&Utc)),
            query.to.map(|dt| dt.with_timezone(&Utc)),
            &user.username,
        )
        .await?;
    Ok(Json(dashboard))
}

pub async fn refresh_statuses(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Query(query): Query<StatusRefresh>,
) -> Result<Json<engine::StatusRefresh>, ServerError> {
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(
        state
            .engine
            .refresh_statuses(&slug, today, &user.username)
            .await?,
    ))
}
