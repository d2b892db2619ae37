//! Purchases, documents and spreadsheet endpoints.

use api_types::{
    Reason,
    purchase::{CollectorAssign, PurchaseList, PurchaseListResponse, PurchaseNew},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use engine::{
    Document, DocumentView, ImportReport, NewPurchaseCmd, Purchase, PurchaseDetail,
    PurchaseListFilter, PurchaseSummary, User,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, wire};

fn list_filter(query: &PurchaseList) -> Result<PurchaseListFilter, ServerError> {
    Ok(PurchaseListFilter {
        shop_slug: query.shop.clone(),
        status: query.status.map(|s| wire(s.as_str())).transpose()?,
        purchase_type: query.purchase_type.map(|t| wire(t.as_str())).transpose()?,
        customer_id: query.customer_id,
        collector_id: query.collector_id,
        from: query.from.map(|dt| dt.with_timezone(&Utc)),
        to: query.to.map(|dt| dt.with_timezone(&Utc)),
    })
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Json(payload): Json<PurchaseNew>,
) -> Result<(StatusCode, Json<PurchaseDetail>), ServerError> {
    let start_date = payload
        .start_date
        .unwrap_or_else(|| Utc::now().date_naive());
    let mut cmd = NewPurchaseCmd::new(
        payload.shop,
        payload.customer_id,
        wire(payload.purchase_type.as_str())?,
        start_date,
    )
    .down_payment(payload.down_payment_minor);
    for line in payload.lines {
        cmd = cmd.line(line.product_id, line.quantity);
    }
    cmd.installment_count = payload.installment_count;
    if let Some(frequency) = payload.frequency {
        cmd.frequency = wire(frequency.as_str())?;
    }
    if let Some(method) = payload.method {
        cmd.method = wire(method.as_str())?;
    }
    cmd.collector_id = payload.collector_id;
    cmd.reference = payload.reference;
    cmd.note = payload.note;

    let detail = state
        .engine
        .create_purchase(&slug, cmd, &user.username)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Query(query): Query<PurchaseList>,
) -> Result<Json<PurchaseListResponse<PurchaseSummary>>, ServerError> {
    let filter = list_filter(&query)?;
    let (purchases, next_cursor) = state
        .engine
        .list_purchases(
            &slug,
            &filter,
            query.limit.unwrap_or(50),
            query.cursor.as_deref(),
            &user.username,
        )
        .await?;
    Ok(Json(PurchaseListResponse {
        purchases,
        next_cursor,
    }))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<Json<PurchaseDetail>, ServerError> {
    Ok(Json(
        state
            .engine
            .purchase_detail(&slug, id, &user.username)
            .await?,
    ))
}

pub async fn cancel(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Json(payload): Json<Reason>,
) -> Result<Json<PurchaseDetail>, ServerError> {
    Ok(Json(
        state
            .engine
            .cancel_purchase(&slug, id, &payload.reason, &user.username)
            .await?,
    ))
}

pub async fn assign_collector(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Json(payload): Json<CollectorAssign>,
) -> Result<Json<Purchase>, ServerError> {
    Ok(Json(
        state
            .engine
            .assign_collector(&slug, id, payload.collector_id, &user.username)
            .await?,
    ))
}

pub async fn waybill(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<(StatusCode, Json<Document>), ServerError> {
    let document = state
        .engine
        .issue_waybill(&slug, id, &user.username)
        .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn documents(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<Document>>, ServerError> {
    Ok(Json(
        state
            .engine
            .purchase_documents(&slug, id, &user.username)
            .await?,
    ))
}

pub async fn document(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<Json<DocumentView>, ServerError> {
    Ok(Json(state.engine.document(&slug, id, &user.username).await?))
}

pub async fn export(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Query(query): Query<PurchaseList>,
) -> Result<impl IntoResponse, ServerError> {
    let filter = list_filter(&query)?;
    let csv = state
        .engine
        .export_purchases_csv(&slug, &filter, &user.username)
        .await?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv))
}

/// The body is the CSV file itself.
pub async fn import(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, shop)): Path<(String, String)>,
    body: String,
) -> Result<Json<ImportReport>, ServerError> {
    Ok(Json(
        state
            .engine
            .import_purchases_csv(&slug, &shop, &body, &user.username)
            .await?,
    ))
}
