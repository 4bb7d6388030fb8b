//! Application state shared across handlers.

use std::sync::Arc;

use crate::commerce::CommerceClient;
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// immutable configuration and the commerce API client. Nothing in here is
/// mutated after startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    commerce: CommerceClient,
}

impl AppState {
    /// Create a new application state from the startup configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let commerce = CommerceClient::new(&config);

        Self {
            inner: Arc::new(AppStateInner { config, commerce }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the commerce API client.
    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }
}
