use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{info, warn};

use crate::actions::{repo::InMemoryActionRepository, ActionService};
use crate::auth::{
    jwt::TokenCodec,
    password::PasswordHasher,
    repo::{InMemoryUserStore, PgUserStore, UserStore},
    services::CredentialService,
};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::db;
use crate::inbox::{repo::InMemoryThingRepository, InboxService};

/// Everything the handlers need, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub credentials: Arc<CredentialService>,
    pub tokens: Arc<TokenCodec>,
    pub inbox: Arc<InboxService>,
    pub actions: Arc<ActionService>,
}

impl FromRef<AppState> for Arc<TokenCodec> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let users: Arc<dyn UserStore> = match &config.database {
            Some(db_cfg) => {
                let pool = db::connect(db_cfg).await?;
                info!("using postgres user store");
                Arc::new(PgUserStore::new(pool))
            }
            None => {
                warn!("DATABASE_URL not set; accounts live in memory and vanish on restart");
                Arc::new(InMemoryUserStore::new())
            }
        };
        Self::from_parts(config, users, PasswordHasher::default(), Arc::new(SystemClock))
    }

    /// Wire the services around an already-built user store and clock.
    pub fn from_parts(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let tokens = Arc::new(TokenCodec::new(&config.jwt.secret, clock.clone())?);
        let credentials = Arc::new(
            CredentialService::new(users, hasher, tokens.clone(), clock.clone())?
                .with_session_ttl(config.session_ttl()),
        );
        let actions = Arc::new(ActionService::new(Arc::new(InMemoryActionRepository::new())));
        let inbox = Arc::new(InboxService::new(
            Arc::new(InMemoryThingRepository::new()),
            actions.clone(),
            clock,
        ));

        Ok(Self {
            config: Arc::new(config),
            credentials,
            tokens,
            inbox,
            actions,
        })
    }
}
