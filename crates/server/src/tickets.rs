//! Support ticket endpoints of a business.

use api_types::ticket::{TicketList, TicketMessageNew, TicketNew, TicketStatusUpdate};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{NewTicketCmd, Ticket, TicketDetail, User};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, wire};

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Json(payload): Json<TicketNew>,
) -> Result<(StatusCode, Json<Ticket>), ServerError> {
    let mut cmd = NewTicketCmd::new(payload.subject, payload.description);
    if let Some(priority) = payload.priority {
        cmd = cmd.priority(wire(priority.as_str())?);
    }
    let ticket = state
        .engine
        .open_ticket(&slug, cmd, &user.username)
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Query(query): Query<TicketList>,
) -> Result<Json<Vec<Ticket>>, ServerError> {
    let status = query.status.map(|s| wire(s.as_str())).transpose()?;
    Ok(Json(
        state
            .engine
            .list_tickets(&slug, status, &user.username)
            .await?,
    ))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<Json<TicketDetail>, ServerError> {
    Ok(Json(
        state
            .engine
            .ticket_detail(&slug, id, &user.username)
            .await?,
    ))
}

pub async fn add_message(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Json(payload): Json<TicketMessageNew>,
) -> Result<(StatusCode, Json<TicketDetail>), ServerError> {
    let detail = state
        .engine
        .add_ticket_message(&slug, id, &payload.body, &user.username)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn change_status(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Json(payload): Json<TicketStatusUpdate>,
) -> Result<Json<Ticket>, ServerError> {
    Ok(Json(
        state
            .engine
            .change_ticket_status(&slug, id, wire(payload.status.as_str())?, &user.username)
            .await?,
    ))
}
