//! `SeaORM` implementation of the `TicketService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::{DeleteOutcome, NewTicket, Store, Ticket};
use crate::domain::{Identity, TicketStatus};
use crate::services::ticket_service::{
    CreateTicket, DEFAULT_CATEGORY, MAX_ADMIN_MESSAGE_LEN, MAX_CATEGORY_LEN, MAX_DESCRIPTION_LEN,
    MAX_TITLE_LEN, TicketError, TicketService,
};

pub struct SeaOrmTicketService {
    store: Store,
}

impl SeaOrmTicketService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn required_text(field: &str, value: &str, max_len: usize) -> Result<String, TicketError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TicketError::Validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max_len {
        return Err(TicketError::Validation(format!(
            "{field} must be {max_len} characters or less"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_category(category: Option<&str>) -> Result<String, TicketError> {
    let category = category.map(str::trim).unwrap_or_default();
    if category.is_empty() {
        return Ok(DEFAULT_CATEGORY.to_string());
    }
    if category.chars().count() > MAX_CATEGORY_LEN {
        return Err(TicketError::Validation(format!(
            "Category must be {MAX_CATEGORY_LEN} characters or less"
        )));
    }
    Ok(category.to_string())
}

fn normalize_admin_message(message: Option<String>) -> Result<Option<String>, TicketError> {
    let Some(message) = message else {
        return Ok(None);
    };
    if message.chars().count() > MAX_ADMIN_MESSAGE_LEN {
        return Err(TicketError::Validation(format!(
            "Admin message must be {MAX_ADMIN_MESSAGE_LEN} characters or less"
        )));
    }
    Ok(Some(message))
}

fn require_admin(identity: &Identity, action: &str) -> Result<(), TicketError> {
    if identity.is_admin() {
        return Ok(());
    }
    warn!(
        account_id = identity.account_id,
        action, "Non-admin attempted admin-only ticket operation"
    );
    Err(TicketError::Forbidden(format!("Only admins may {action}")))
}

#[async_trait]
impl TicketService for SeaOrmTicketService {
    async fn create(
        &self,
        identity: &Identity,
        input: CreateTicket,
    ) -> Result<Ticket, TicketError> {
        let ticket = NewTicket {
            owner_id: identity.account_id,
            title: required_text("Title", &input.title, MAX_TITLE_LEN)?,
            description: required_text("Description", &input.description, MAX_DESCRIPTION_LEN)?,
            category: normalize_category(input.category.as_deref())?,
            priority: input.priority,
        };

        self.store
            .create_ticket(ticket)
            .await?
            .ok_or(TicketError::OwnerNotFound(identity.account_id))
    }

    async fn list_for_owner(
        &self,
        identity: &Identity,
        owner_id: i32,
    ) -> Result<Vec<Ticket>, TicketError> {
        if !identity.can_access_account(owner_id) {
            return Err(TicketError::Forbidden(
                "Cannot list another account's tickets".to_string(),
            ));
        }

        Ok(self.store.list_tickets_for_owner(owner_id).await?)
    }

    async fn list_all(&self, identity: &Identity) -> Result<Vec<Ticket>, TicketError> {
        require_admin(identity, "list all tickets")?;
        Ok(self.store.list_all_tickets().await?)
    }

    async fn update(
        &self,
        identity: &Identity,
        ticket_id: i32,
        status: TicketStatus,
        admin_message: Option<String>,
    ) -> Result<Ticket, TicketError> {
        require_admin(identity, "update tickets")?;
        let admin_message = normalize_admin_message(admin_message)?;

        let ticket = self
            .store
            .update_ticket_status(ticket_id, status, admin_message)
            .await?
            .ok_or(TicketError::NotFound(ticket_id))?;

        info!(
            ticket_id,
            status = %ticket.status,
            admin = %identity.username,
            "Ticket updated"
        );
        Ok(ticket)
    }

    async fn delete(&self, identity: &Identity, ticket_id: i32) -> Result<(), TicketError> {
        let caller = identity.clone();
        let outcome = self
            .store
            .delete_ticket_if(ticket_id, move |ticket| {
                caller.can_access_account(ticket.owner_id)
            })
            .await?;

        match outcome {
            DeleteOutcome::Deleted(_) => Ok(()),
            DeleteOutcome::NotFound => Err(TicketError::NotFound(ticket_id)),
            DeleteOutcome::Denied => {
                warn!(
                    ticket_id,
                    account_id = identity.account_id,
                    "Delete denied: caller is neither owner nor admin"
                );
                Err(TicketError::Forbidden(
                    "Only the ticket owner or an admin may delete it".to_string(),
                ))
            }
        }
    }
}
