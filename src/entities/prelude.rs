pub use super::accounts::Entity as Accounts;
pub use super::tickets::Entity as Tickets;
