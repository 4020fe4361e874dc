pub mod actions;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod schema;
pub mod services;
pub mod startup;

use actions::InvoiceActions;
use services::{AuthProvider, InvoiceStore, RouteCache};
use std::sync::Arc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub actions: Arc<InvoiceActions>,
    pub store: Arc<dyn InvoiceStore>,
    pub cache: Arc<RouteCache>,
    pub auth_provider: Arc<dyn AuthProvider>,
    /// Strategy identifier passed with every sign-in.
    pub sign_in_strategy: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn InvoiceStore>,
        auth_provider: Arc<dyn AuthProvider>,
        sign_in_strategy: impl Into<String>,
    ) -> Self {
        Self::with_cache(store, auth_provider, sign_in_strategy, RouteCache::new())
    }

    pub fn with_cache(
        store: Arc<dyn InvoiceStore>,
        auth_provider: Arc<dyn AuthProvider>,
        sign_in_strategy: impl Into<String>,
        cache: RouteCache,
    ) -> Self {
        let cache = Arc::new(cache);
        let actions = Arc::new(InvoiceActions::new(store.clone(), cache.clone()));
        Self {
            actions,
            store,
            cache,
            auth_provider,
            sign_in_strategy: sign_in_strategy.into(),
        }
    }
}
