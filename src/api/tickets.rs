use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::{validate_account_id, validate_ticket_id};
use super::{
    ApiError, AppState, CreateTicketRequest, CreateTicketResponse, MessageResponse, TicketDto,
    UpdateTicketRequest,
};
use crate::domain::Identity;
use crate::services::CreateTicket;

/// POST /tickets
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTicketResponse>), ApiError> {
    let Json(payload) = payload?;

    let ticket = state
        .ticket_service()
        .create(
            &identity,
            CreateTicket {
                title: payload.title,
                description: payload.description,
                priority: payload.priority,
                category: payload.category,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTicketResponse {
            ticket_id: ticket.id,
        }),
    ))
}

/// GET /tickets/user/{id}
pub async fn list_user_tickets(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    owner_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<TicketDto>>, ApiError> {
    let Path(owner_id) = owner_id?;
    let owner_id = validate_account_id(owner_id)?;

    let tickets = state
        .ticket_service()
        .list_for_owner(&identity, owner_id)
        .await?;

    Ok(Json(tickets.into_iter().map(TicketDto::from).collect()))
}

/// GET /tickets/all
pub async fn list_all_tickets(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<TicketDto>>, ApiError> {
    let tickets = state.ticket_service().list_all(&identity).await?;
    Ok(Json(tickets.into_iter().map(TicketDto::from).collect()))
}

/// PUT /tickets/{id}
pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ticket_id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateTicketRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(ticket_id) = ticket_id?;
    let ticket_id = validate_ticket_id(ticket_id)?;
    let Json(payload) = payload?;

    let ticket = state
        .ticket_service()
        .update(&identity, ticket_id, payload.status, payload.admin_message)
        .await?;

    Ok(Json(MessageResponse::new(format!(
        "Ticket {} updated to {}",
        ticket.id, ticket.status
    ))))
}

/// DELETE /tickets/{id}
pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ticket_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(ticket_id) = ticket_id?;
    let ticket_id = validate_ticket_id(ticket_id)?;

    state.ticket_service().delete(&identity, ticket_id).await?;

    Ok(Json(MessageResponse::new(format!(
        "Ticket {ticket_id} deleted"
    ))))
}
