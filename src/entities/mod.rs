pub mod prelude;

pub mod accounts;
pub mod tickets;
