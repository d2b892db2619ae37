//! Shop endpoints.

use api_types::shop::{ShopNew, ShopUpdate};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Shop, ShopPatch, User};

use crate::{ServerError, server::ServerState};

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Json(payload): Json<ShopNew>,
) -> Result<(StatusCode, Json<Shop>), ServerError> {
    let shop = state
        .engine
        .create_shop(
            &slug,
            &payload.name,
            payload.address.as_deref(),
            payload.phone.as_deref(),
            &user.username,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(shop)))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<Shop>>, ServerError> {
    Ok(Json(state.engine.list_shops(&slug, &user.username).await?))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, shop)): Path<(String, String)>,
) -> Result<Json<Shop>, ServerError> {
    Ok(Json(
        state
            .engine
            .shop_by_slug(&slug, &shop, &user.username)
            .await?,
    ))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, shop_slug)): Path<(String, String)>,
    Json(payload): Json<ShopUpdate>,
) -> Result<Json<Shop>, ServerError> {
    if payload.name.is_none()
        && payload.address.is_none()
        && payload.phone.is_none()
        && payload.active.is_none()
    {
        return Err(ServerError::Generic(
            "provide at least one field to update".to_string(),
        ));
    }

    let mut shop = None;
    if payload.name.is_some() || payload.address.is_some() || payload.phone.is_some() {
        let patch = ShopPatch {
            name: payload.name,
            phone: payload.phone,
            address: payload.address,
        };
        shop = Some(
            state
                .engine
                .update_shop(&slug, &shop_slug, patch, &user.username)
                .await?,
        );
    }
    if let Some(active) = payload.active {
        shop = Some(
            state
                .engine
                .set_shop_active(&slug, &shop_slug, active, &user.username)
                .await?,
        );
    }
    shop.map(Json)
        .ok_or_else(|| ServerError::Generic("nothing updated".to_string()))
}

pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, shop)): Path<(String, String)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_shop(&slug, &shop, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
