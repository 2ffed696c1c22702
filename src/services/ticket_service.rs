//! Domain service for helpdesk tickets.
//!
//! Every operation takes the caller's [`Identity`] and enforces the role and
//! ownership rules before touching the store.

use thiserror::Error;

use crate::db::Ticket;
use crate::domain::{Identity, TicketPriority, TicketStatus};

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 1000;
pub const MAX_CATEGORY_LEN: usize = 50;
pub const MAX_ADMIN_MESSAGE_LEN: usize = 1000;
pub const DEFAULT_CATEGORY: &str = "technical";

/// Errors specific to ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error("Ticket {0} not found")]
    NotFound(i32),

    #[error("Account {0} not found")]
    OwnerNotFound(i32),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for TicketError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for TicketError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Input for [`TicketService::create`].
#[derive(Debug, Clone)]
pub struct CreateTicket {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub category: Option<String>,
}

/// Domain service trait for tickets.
#[async_trait::async_trait]
pub trait TicketService: Send + Sync {
    /// Files a new `open` ticket owned by the caller. Returns the new ticket.
    async fn create(&self, identity: &Identity, input: CreateTicket)
    -> Result<Ticket, TicketError>;

    /// Tickets owned by `owner_id`, newest first. Caller must be the owner or an admin.
    async fn list_for_owner(
        &self,
        identity: &Identity,
        owner_id: i32,
    ) -> Result<Vec<Ticket>, TicketError>;

    /// Every ticket with its owner's username, newest first. Admin only.
    async fn list_all(&self, identity: &Identity) -> Result<Vec<Ticket>, TicketError>;

    /// Sets status and admin message. Admin only.
    async fn update(
        &self,
        identity: &Identity,
        ticket_id: i32,
        status: TicketStatus,
        admin_message: Option<String>,
    ) -> Result<Ticket, TicketError>;

    /// Deletes a ticket. Caller must be the owner or an admin.
    async fn delete(&self, identity: &Identity, ticket_id: i32) -> Result<(), TicketError>;
}
