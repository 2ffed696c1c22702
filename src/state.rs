use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccessGuard, AuthService, ProfileService, SeaOrmAuthService, SeaOrmProfileService,
    SeaOrmTicketService, TicketService, TokenCodec,
};

/// Process-wide state shared by the HTTP layer and the CLI commands.
///
/// Configuration is read once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub guard: AccessGuard,

    pub auth_service: Arc<dyn AuthService>,

    pub ticket_service: Arc<dyn TicketService>,

    pub profile_service: Arc<dyn ProfileService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let tokens = Arc::new(TokenCodec::from_config(&config.security)?);

        let auth_service = Arc::new(SeaOrmAuthService::new(store.clone(), tokens.clone()))
            as Arc<dyn AuthService>;
        let ticket_service = Arc::new(SeaOrmTicketService::new(store.clone()))
            as Arc<dyn TicketService>;
        let profile_service = Arc::new(SeaOrmProfileService::new(store.clone()))
            as Arc<dyn ProfileService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            guard: AccessGuard::new(tokens),
            auth_service,
            ticket_service,
            profile_service,
        })
    }
}
