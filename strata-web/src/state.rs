//! Application state wiring the web layer to the application service

use crate::auth::{HttpKeyFetcher, KeyFetcher, SigningKeyCache, TokenValidationConfig};
use crate::{WebConfig, WebResult};
use std::sync::Arc;
use strata_applications::{ApplicationConfig, StrataApplication};
use tracing::info;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Web configuration
    pub config: WebConfig,
    /// Main application service
    pub application: Arc<StrataApplication>,
    /// Shared signing-key cache for token validation
    pub key_cache: Arc<SigningKeyCache>,
    /// Token validation parameters
    pub token_validation: TokenValidationConfig,
}

impl AppState {
    /// Create a new application state with file-backed storage and git
    /// publishing.
    pub fn new(config: WebConfig) -> WebResult<Self> {
        let app_config = match &config.data_dir {
            Some(dir) => ApplicationConfig::rooted(dir.clone()),
            None => ApplicationConfig::default(),
        }
        .with_super_admins(config.super_admins.clone());

        let application = Arc::new(StrataApplication::new(app_config));
        let fetcher: Arc<dyn KeyFetcher> = Arc::new(HttpKeyFetcher::new(&config.jwks_url));

        let state = Self::with_application(config, application, fetcher);
        info!("Application state initialized");
        Ok(state)
    }

    /// Assemble state from preconstructed collaborators (used by tests and
    /// embedders that bring their own storage or key fetcher).
    pub fn with_application(
        config: WebConfig,
        application: Arc<StrataApplication>,
        fetcher: Arc<dyn KeyFetcher>,
    ) -> Self {
        let token_validation = TokenValidationConfig {
            audience: config.audience.clone(),
            issuer: config.issuer.clone(),
        };

        Self {
            config,
            application,
            key_cache: Arc::new(SigningKeyCache::new(fetcher)),
            token_validation,
        }
    }
}
