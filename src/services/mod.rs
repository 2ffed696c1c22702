pub mod token;
pub use token::{IssuedToken, SessionClaims, TokenCodec, TokenError};

pub mod access_guard;
pub use access_guard::AccessGuard;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;

pub mod ticket_service;
pub mod ticket_service_impl;
pub use ticket_service::{CreateTicket, TicketError, TicketService};
pub use ticket_service_impl::SeaOrmTicketService;

pub mod profile_service;
pub mod profile_service_impl;
pub use profile_service::{Profile, ProfileError, ProfileService, ProfileUpdate};
pub use profile_service_impl::SeaOrmProfileService;
