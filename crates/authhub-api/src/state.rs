//! Shared application state passed to handlers.

use std::sync::Arc;

use authhub_auth::jwt::SigningKeys;
use authhub_core::config::AppConfig;
use authhub_core::result::AppResult;
use authhub_database::store::CredentialStore;
use authhub_service::{AuthEngine, NotificationDispatcher};

use crate::middleware::rate_limit::RateLimiter;

/// State cloned into every handler. All fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Authentication flows.
    pub engine: AuthEngine,
    /// Credential store, used directly by the health probe.
    pub store: CredentialStore,
    /// Per-process rate-limit counters.
    pub rate_limiter: RateLimiter,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .field("rate_limiter", &self.rate_limiter)
            .finish()
    }
}

impl AppState {
    /// Wires the engine and limiter over `store`.
    pub fn build(
        config: AppConfig,
        store: CredentialStore,
        keys: Arc<SigningKeys>,
        notifier: NotificationDispatcher,
    ) -> AppResult<Self> {
        let engine = AuthEngine::from_store(&store, keys, notifier, &config.auth)?;
        let rate_limiter = RateLimiter::new(config.rate_limit.clone());
        Ok(Self {
            config: Arc::new(config),
            engine,
            store,
            rate_limiter,
        })
    }
}
