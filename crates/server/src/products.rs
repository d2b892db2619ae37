//! Product and inventory endpoints.

use api_types::product::{ProductList, ProductNew, ProductUpdate, StockAdjust, StockHistory};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{DeleteOutcome, NewProductCmd, Product, ProductPatch, StockMovement, User};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, wire};

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, shop)): Path<(String, String)>,
    Json(payload): Json<ProductNew>,
) -> Result<(StatusCode, Json<Product>), ServerError> {
    let mut cmd = NewProductCmd::new(payload.name, payload.price_minor)
        .cost(payload.cost_minor)
        .stock(payload.stock_quantity)
        .reorder_level(payload.reorder_level);
    cmd.sku = payload.sku;
    cmd.description = payload.description;

    let product = state
        .engine
        .create_product(&slug, &shop, cmd, &user.username)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, shop)): Path<(String, String)>,
    Query(query): Query<ProductList>,
) -> Result<Json<Vec<Product>>, ServerError> {
    let products = state
        .engine
        .list_products(
            &slug,
            &shop,
            query.include_archived,
            query.search.as_deref(),
            &user.username,
        )
        .await?;
    Ok(Json(products))
}

pub async fn low_stock(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, shop)): Path<(String, String)>,
) -> Result<Json<Vec<Product>>, ServerError> {
    Ok(Json(
        state
            .engine
            .low_stock(&slug, &shop, &user.username)
            .await?,
    ))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<Json<Product>, ServerError> {
    Ok(Json(state.engine.product(&slug, id, &user.username).await?))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Json(payload): Json<ProductUpdate>,
) -> Result<Json<Product>, ServerError> {
    let patch = ProductPatch {
        name: payload.name,
        sku: payload.sku,
        description: payload.description,
        price_minor: payload.price_minor,
        cost_minor: payload.cost_minor,
        reorder_level: payload.reorder_level,
        archived: payload.archived,
    };
    Ok(Json(
        state
            .engine
            .update_product(&slug, id, patch, &user.username)
            .await?,
    ))
}

/// Products with sales are archived instead of deleted.
pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<Json<DeleteOutcome>, ServerError> {
    Ok(Json(
        state
            .engine
            .delete_product(&slug, id, &user.username)
            .await?,
    ))
}

pub async fn adjust_stock(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Json(payload): Json<StockAdjust>,
) -> Result<Json<Product>, ServerError> {
    let product = state
        .engine
        .adjust_stock(
            &slug,
            id,
            payload.change,
            wire(payload.reason.as_str())?,
            payload.note.as_deref(),
            &user.username,
        )
        .await?;
    Ok(Json(product))
}

pub async fn stock_history(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Query(query): Query<StockHistory>,
) -> Result<Json<Vec<StockMovement>>, ServerError> {
    let movements = state
        .engine
        .stock_history(&slug, id, query.limit.unwrap_or(50), &user.username)
        .await?;
    Ok(Json(movements))
}
