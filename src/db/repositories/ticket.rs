use crate::domain::{TicketPriority, TicketStatus};
use crate::entities::{accounts, prelude::*, tickets};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

/// Repository for ticket operations
pub struct TicketRepository {
    conn: DatabaseConnection,
}

impl TicketRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_ticket_model(t: tickets::Model, owner: Option<accounts::Model>) -> Result<Ticket> {
        let priority = t
            .priority
            .parse()
            .with_context(|| format!("Ticket {} has an invalid priority", t.id))?;
        let status = t
            .status
            .parse()
            .with_context(|| format!("Ticket {} has an invalid status", t.id))?;

        Ok(Ticket {
            id: t.id,
            title: t.title,
            description: t.description,
            category: t.category,
            priority,
            status,
            owner_id: t.owner_id,
            owner_username: owner.map(|o| o.username),
            admin_message: t.admin_message,
            created_at: t.created_at,
            updated_at: t.updated_at,
        })
    }

    fn map_rows(rows: Vec<(tickets::Model, Option<accounts::Model>)>) -> Result<Vec<Ticket>> {
        rows.into_iter()
            .map(|(t, owner)| Self::map_ticket_model(t, owner))
            .collect()
    }

    // ========================================================================
    // Ticket Operations
    // ========================================================================

    /// Insert a ticket in `open` status. Returns `None` if the owner does not exist.
    pub async fn create(&self, ticket: NewTicket) -> Result<Option<Ticket>> {
        let txn = self.conn.begin().await?;

        let Some(owner) = Accounts::find_by_id(ticket.owner_id).one(&txn).await? else {
            return Ok(None);
        };

        let now = crate::db::now_timestamp();
        let active_model = tickets::ActiveModel {
            title: Set(ticket.title),
            description: Set(ticket.description),
            category: Set(ticket.category),
            priority: Set(ticket.priority.as_str().to_string()),
            status: Set(TicketStatus::Open.as_str().to_string()),
            owner_id: Set(owner.id),
            admin_message: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&txn).await?;
        txn.commit().await?;

        info!("Created ticket {} for account {}", model.id, owner.id);
        Self::map_ticket_model(model, Some(owner)).map(Some)
    }

    pub async fn get(&self, id: i32) -> Result<Option<Ticket>> {
        let row = Tickets::find_by_id(id)
            .find_also_related(Accounts)
            .one(&self.conn)
            .await?;

        row.map(|(t, owner)| Self::map_ticket_model(t, owner))
            .transpose()
    }

    /// Tickets owned by `owner_id`, newest first.
    pub async fn list_for_owner(&self, owner_id: i32) -> Result<Vec<Ticket>> {
        let rows = Tickets::find()
            .find_also_related(Accounts)
            .filter(tickets::Column::OwnerId.eq(owner_id))
            .order_by_desc(tickets::Column::CreatedAt)
            .order_by_desc(tickets::Column::Id)
            .all(&self.conn)
            .await?;

        Self::map_rows(rows)
    }

    /// Every ticket, newest first.
    pub async fn list_all(&self) -> Result<Vec<Ticket>> {
        let rows = Tickets::find()
            .find_also_related(Accounts)
            .order_by_desc(tickets::Column::CreatedAt)
            .order_by_desc(tickets::Column::Id)
            .all(&self.conn)
            .await?;

        Self::map_rows(rows)
    }

    /// Set status and admin message. Returns `None` if the ticket does not exist.
    pub async fn update_status(
        &self,
        id: i32,
        status: TicketStatus,
        admin_message: Option<String>,
    ) -> Result<Option<Ticket>> {
        let txn = self.conn.begin().await?;

        let Some(model) = Tickets::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        // Never move updated_at backwards, even if the clock does.
        let now = crate::db::now_timestamp().max(model.updated_at.clone());

        let mut active: tickets::ActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        active.admin_message = Set(admin_message);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        let owner = Accounts::find_by_id(updated.owner_id).one(&txn).await?;
        txn.commit().await?;

        Self::map_ticket_model(updated, owner).map(Some)
    }

    /// Delete a ticket if `allow` approves it, checking and deleting in one transaction.
    pub async fn delete_if<F>(&self, id: i32, allow: F) -> Result<DeleteOutcome>
    where
        F: FnOnce(&Ticket) -> bool + Send,
    {
        let txn = self.conn.begin().await?;

        let Some((model, owner)) = Tickets::find_by_id(id)
            .find_also_related(Accounts)
            .one(&txn)
            .await?
        else {
            return Ok(DeleteOutcome::NotFound);
        };

        let ticket = Self::map_ticket_model(model, owner)?;
        if !allow(&ticket) {
            return Ok(DeleteOutcome::Denied);
        }

        let result = Tickets::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        if result.rows_affected == 0 {
            return Ok(DeleteOutcome::NotFound);
        }

        info!("Deleted ticket {}", id);
        Ok(DeleteOutcome::Deleted(ticket))
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub owner_id: i32,
    pub owner_username: Option<String>,
    pub admin_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub owner_id: i32,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: TicketPriority,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(Ticket),
    Denied,
    NotFound,
}
