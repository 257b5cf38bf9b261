use std::sync::Arc;
use thiserror::Error;

use crate::auth::{AuthError, SessionVerifier};
use crate::config::AppConfig;
use crate::database::Store;
use crate::services::UserSyncService;
use crate::webhooks::{SignatureError, WebhookVerifier};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("session auth: {0}")]
    Auth(#[from] AuthError),

    #[error("webhook secret: {0}")]
    Webhook(#[from] SignatureError),
}

/// Shared per-process handles, cloned into every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub sync: Arc<UserSyncService>,
    pub sessions: Option<Arc<SessionVerifier>>,
    pub webhooks: Option<Arc<WebhookVerifier>>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self, StateError> {
        let sessions = SessionVerifier::from_config(&config.security)?.map(Arc::new);

        let webhooks = config
            .webhook
            .signing_secret
            .as_deref()
            .map(|secret| WebhookVerifier::new(secret, config.webhook.tolerance_secs))
            .transpose()?
            .map(Arc::new);

        let sync = Arc::new(UserSyncService::new(store.clone(), config.webhook.sync_mode));

        Ok(Self {
            config: Arc::new(config),
            store,
            sync,
            sessions,
            webhooks,
        })
    }
}
