use crate::config::SecurityConfig;
use crate::domain::{Role, TicketStatus};
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::account::{Account, ProfileFields};
pub use repositories::ticket::{DeleteOutcome, NewTicket, Ticket};

/// Current UTC time as a fixed-width RFC 3339 string.
///
/// Fixed width keeps lexical order equal to chronological order, which the
/// `created_at`/`updated_at` columns rely on for sorting and comparison.
#[must_use]
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:");
        if !path_str.contains(":memory:") {
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn ticket_repo(&self) -> repositories::ticket::TicketRepository {
        repositories::ticket::TicketRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    pub async fn get_account(&self, id: i32) -> Result<Option<Account>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn get_account_credentials(
        &self,
        username: &str,
        role: Role,
    ) -> Result<Option<(Account, String)>> {
        self.account_repo().get_credentials(username, role).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.account_repo().list_all().await
    }

    pub async fn create_account(
        &self,
        username: &str,
        password: &str,
        role: Role,
        security: &SecurityConfig,
    ) -> Result<Account> {
        self.account_repo()
            .create(username, password, role, security)
            .await
    }

    pub async fn update_account_profile(
        &self,
        id: i32,
        fields: ProfileFields,
    ) -> Result<Option<Account>> {
        self.account_repo().update_profile(id, fields).await
    }

    // ========================================================================
    // Tickets
    // ========================================================================

    pub async fn create_ticket(&self, ticket: NewTicket) -> Result<Option<Ticket>> {
        self.ticket_repo().create(ticket).await
    }

    pub async fn get_ticket(&self, id: i32) -> Result<Option<Ticket>> {
        self.ticket_repo().get(id).await
    }

    pub async fn list_tickets_for_owner(&self, owner_id: i32) -> Result<Vec<Ticket>> {
        self.ticket_repo().list_for_owner(owner_id).await
    }

    pub async fn list_all_tickets(&self) -> Result<Vec<Ticket>> {
        self.ticket_repo().list_all().await
    }

    pub async fn update_ticket_status(
        &self,
        id: i32,
        status: TicketStatus,
        admin_message: Option<String>,
    ) -> Result<Option<Ticket>> {
        self.ticket_repo()
            .update_status(id, status, admin_message)
            .await
    }

    pub async fn delete_ticket_if<F>(&self, id: i32, allow: F) -> Result<DeleteOutcome>
    where
        F: FnOnce(&Ticket) -> bool + Send,
    {
        self.ticket_repo().delete_if(id, allow).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TicketPriority;

    async fn memory_store() -> Store {
        Store::with_pool_options("sqlite::memory:", 1, 1)
            .await
            .expect("in-memory store")
    }

    fn fast_security() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn timestamps_sort_chronologically() {
        let first = now_timestamp();
        std::thread::sleep(Duration::from_millis(2));
        let second = now_timestamp();
        assert_eq!(first.len(), second.len());
        assert!(second > first);
    }

    #[tokio::test]
    async fn same_username_allowed_once_per_role() {
        let store = memory_store().await;
        let security = fast_security();

        store
            .create_account("om", "pw-user", Role::User, &security)
            .await
            .unwrap();
        store
            .create_account("om", "pw-admin", Role::Admin, &security)
            .await
            .unwrap();
        assert!(
            store
                .create_account("om", "again", Role::User, &security)
                .await
                .is_err()
        );

        let (user, _) = store
            .get_account_credentials("om", Role::User)
            .await
            .unwrap()
            .unwrap();
        let (admin, _) = store
            .get_account_credentials("om", Role::Admin)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(user.id, admin.id);
    }

    #[tokio::test]
    async fn password_is_stored_hashed() {
        let store = memory_store().await;
        store
            .create_account("admin", "admin123", Role::Admin, &fast_security())
            .await
            .unwrap();

        let (_, hash) = store
            .get_account_credentials("admin", Role::Admin)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(hash, "admin123");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn ticket_requires_existing_owner() {
        let store = memory_store().await;
        let created = store
            .create_ticket(NewTicket {
                owner_id: 42,
                title: "orphan".to_string(),
                description: "no owner".to_string(),
                category: "technical".to_string(),
                priority: TicketPriority::Low,
            })
            .await
            .unwrap();
        assert!(created.is_none());
        assert!(store.list_all_tickets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn tickets_listed_newest_first_with_owner() {
        let store = memory_store().await;
        let owner = store
            .create_account("om", "Om9", Role::User, &fast_security())
            .await
            .unwrap();

        for title in ["first", "second", "third"] {
            store
                .create_ticket(NewTicket {
                    owner_id: owner.id,
                    title: title.to_string(),
                    description: "details".to_string(),
                    category: "hardware".to_string(),
                    priority: TicketPriority::Medium,
                })
                .await
                .unwrap()
                .unwrap();
        }

        let tickets = store.list_tickets_for_owner(owner.id).await.unwrap();
        let titles: Vec<_> = tickets.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["third", "second", "first"]);
        assert!(
            tickets
                .iter()
                .all(|t| t.owner_username.as_deref() == Some("om"))
        );
        assert!(tickets.iter().all(|t| t.status == TicketStatus::Open));
    }

    #[tokio::test]
    async fn profile_update_replaces_fields() {
        let store = memory_store().await;
        let account = store
            .create_account("om", "Om9", Role::User, &fast_security())
            .await
            .unwrap();

        let updated = store
            .update_account_profile(
                account.id,
                ProfileFields {
                    email: Some("om@example.com".to_string()),
                    phone: None,
                    department: Some("IT".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.email.as_deref(), Some("om@example.com"));
        assert_eq!(updated.department.as_deref(), Some("IT"));
        assert!(updated.updated_at >= account.updated_at);

        assert!(
            store
                .update_account_profile(999, ProfileFields::default())
                .await
                .unwrap()
                .is_none()
        );
    }
}
