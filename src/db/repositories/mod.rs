pub mod account;
pub mod ticket;
