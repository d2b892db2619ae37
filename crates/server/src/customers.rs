//! Customer endpoints.

use api_types::customer::{CustomerList, CustomerNew, CustomerUpdate};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Customer, CustomerPatch, CustomerStatement, NewCustomerCmd, User};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Json(payload): Json<CustomerNew>,
) -> Result<(StatusCode, Json<Customer>), ServerError> {
    let mut cmd = NewCustomerCmd::new(payload.name, payload.phone);
    cmd.shop_id = payload.shop_id;
    cmd.email = payload.email;
    cmd.address = payload.address;
    cmd.national_id = payload.national_id;

    let customer = state
        .engine
        .create_customer(&slug, cmd, &user.username)
        .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Query(query): Query<CustomerList>,
) -> Result<Json<Vec<Customer>>, ServerError> {
    let customers = state
        .engine
        .list_customers(
            &slug,
            query.search.as_deref(),
            query.include_inactive,
            &user.username,
        )
        .await?;
    Ok(Json(customers))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<Json<Customer>, ServerError> {
    Ok(Json(state.engine.customer(&slug, id, &user.username).await?))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Json(payload): Json<CustomerUpdate>,
) -> Result<Json<Customer>, ServerError> {
    let active = payload.active;
    let patch = CustomerPatch {
        name: payload.name,
        phone: payload.phone,
        email: payload.email,
        address: payload.address,
        national_id: payload.national_id,
    };
    let has_patch = patch.name.is_some()
        || patch.phone.is_some()
        || patch.email.is_some()
        || patch.address.is_some()
        || patch.national_id.is_some();
    if !has_patch && active.is_none() {
        return Err(ServerError::Generic(
            "provide at least one field to update".to_string(),
        ));
    }

    let mut customer = None;
    if has_patch {
        customer = Some(
            state
                .engine
                .update_customer(&slug, id, patch, &user.username)
                .await?,
        );
    }
    if let Some(active) = active {
        customer = Some(
            state
                .engine
                .set_customer_active(&slug, id, active, &user.username)
                .await?,
        );
    }
    customer
        .map(Json)
        .ok_or_else(|| ServerError::Generic("nothing updated".to_string()))
}

pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_customer(&slug, id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn statement(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<Json<CustomerStatement>, ServerError> {
    Ok(Json(
        state
            .engine
            .customer_statement(&slug, id, &user.username)
            .await?,
    ))
}
