//! Rendered-page cache keyed by route.
//!
//! Read handlers memoise their rendered output here; mutations call
//! [`PageCache::revalidate`] so the next view of the route is recomputed.

use crate::services::metrics::PAGE_CACHE_LOOKUPS;
use dashmap::DashMap;
use serde_json::Value;
use service_core::error::AppError;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Page limit used when none is configured.
pub const DEFAULT_MAX_PAGES: usize = 256;

/// Invalidation signal for cached route output.
pub trait PageCache: Send + Sync {
    /// Mark everything rendered under `route` as stale.
    fn revalidate(&self, route: &str);
}

struct CachedPage {
    page: Arc<Value>,
    /// Fill order, oldest evicted first.
    filled: u64,
}

pub struct RouteCache {
    pages: DashMap<String, CachedPage>,
    /// Bumped on every revalidation so renders that straddle one are not stored.
    generation: AtomicU64,
    fills: AtomicU64,
    max_pages: usize,
    /// Shared while a render is stored, exclusive while revalidating.
    fill_guard: RwLock<()>,
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::with_max_pages(DEFAULT_MAX_PAGES)
    }
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `max_pages` pages; zero disables caching.
    pub fn with_max_pages(max_pages: usize) -> Self {
        Self {
            pages: DashMap::new(),
            generation: AtomicU64::new(0),
            fills: AtomicU64::new(0),
            max_pages,
            fill_guard: RwLock::new(()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<Value>> {
        self.pages.get(key).map(|entry| Arc::clone(&entry.page))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Return the cached page for `key`, rendering and storing it on a miss.
    pub async fn get_or_render<F, Fut>(&self, key: String, render: F) -> Result<Arc<Value>, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, AppError>>,
    {
        if let Some(page) = self.get(&key) {
            PAGE_CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
            return Ok(page);
        }
        PAGE_CACHE_LOOKUPS.with_label_values(&["miss"]).inc();

        let generation = self.generation.load(Ordering::Acquire);
        let page = Arc::new(render().await?);
        self.fill(key, Arc::clone(&page), generation);

        Ok(page)
    }

    fn fill(&self, key: String, page: Arc<Value>, rendered_at: u64) {
        if self.max_pages == 0 {
            return;
        }

        let _fill = self.fill_guard.read().unwrap_or_else(PoisonError::into_inner);
        if self.generation.load(Ordering::Acquire) != rendered_at {
            debug!(key = %key, "Skipping cache fill after concurrent revalidation");
            return;
        }

        if !self.pages.contains_key(&key) {
            while self.pages.len() >= self.max_pages {
                if !self.evict_oldest() {
                    break;
                }
            }
        }

        let filled = self.fills.fetch_add(1, Ordering::Relaxed);
        self.pages.insert(key, CachedPage { page, filled });
    }

    fn evict_oldest(&self) -> bool {
        let oldest = self
            .pages
            .iter()
            .min_by_key(|entry| entry.value().filled)
            .map(|entry| entry.key().clone());

        match oldest {
            Some(key) => {
                debug!(key = %key, "Evicting oldest cached page");
                self.pages.remove(&key).is_some()
            }
            None => false,
        }
    }
}

impl PageCache for RouteCache {
    fn revalidate(&self, route: &str) {
        let _revalidating = self.fill_guard.write().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        let before = self.pages.len();
        self.pages.retain(|key, _| !is_under_route(key, route));
        debug!(
            route = %route,
            evicted = before.saturating_sub(self.pages.len()),
            "Route revalidated"
        );
    }
}

fn is_under_route(key: &str, route: &str) -> bool {
    match key.strip_prefix(route) {
        Some(rest) => rest.is_empty() || rest.starts_with('?') || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let cache = RouteCache::new();
        let first = cache
            .get_or_render("/dashboard/invoices?page=1".to_string(), || async {
                Ok(json!({ "invoices": [] }))
            })
            .await
            .unwrap();

        let second = cache
            .get_or_render("/dashboard/invoices?page=1".to_string(), || async {
                Err(AppError::ServiceUnavailable)
            })
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn render_errors_are_not_cached() {
        let cache = RouteCache::new();
        let result = cache
            .get_or_render("/dashboard/invoices".to_string(), || async {
                Err(AppError::ServiceUnavailable)
            })
            .await;

        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn revalidate_evicts_only_pages_under_the_route() {
        let cache = RouteCache::new();
        for key in [
            "/dashboard/invoices",
            "/dashboard/invoices?query=&page=2",
            "/dashboard/invoices/8f1c",
            "/dashboard/invoices-archive",
            "/dashboard/customers",
        ] {
            cache
                .get_or_render(key.to_string(), || async { Ok(json!({})) })
                .await
                .unwrap();
        }

        cache.revalidate("/dashboard/invoices");

        assert_eq!(cache.len(), 2);
        assert!(cache.get("/dashboard/invoices-archive").is_some());
        assert!(cache.get("/dashboard/customers").is_some());
    }

    #[tokio::test]
    async fn render_straddling_a_revalidation_is_not_stored() {
        let cache = RouteCache::new();
        let mutator = &cache;
        let page = cache
            .get_or_render("/dashboard/invoices".to_string(), || async move {
                mutator.revalidate("/dashboard/invoices");
                Ok(json!({ "stale": true }))
            })
            .await
            .unwrap();

        assert_eq!(page["stale"], true);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn oldest_page_is_evicted_at_capacity() {
        let cache = RouteCache::with_max_pages(2);
        for page in 1..=3 {
            let key = format!("/dashboard/invoices?query=&page={}", page);
            cache
                .get_or_render(key, move || async move { Ok(json!({ "page": page })) })
                .await
                .unwrap();
        }

        assert_eq!(cache.len(), 2);
        assert!(cache.get("/dashboard/invoices?query=&page=1").is_none());
        assert!(cache.get("/dashboard/invoices?query=&page=2").is_some());
        assert!(cache.get("/dashboard/invoices?query=&page=3").is_some());
    }

    #[tokio::test]
    async fn zero_capacity_never_stores() {
        let cache = RouteCache::with_max_pages(0);
        cache
            .get_or_render("/dashboard/invoices".to_string(), || async { Ok(json!({})) })
            .await
            .unwrap();

        assert!(cache.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn no_page_rendered_before_a_revalidation_survives_it() {
        let cache = Arc::new(RouteCache::new());
        let version = Arc::new(AtomicU64::new(0));
        let key = "/dashboard/invoices?query=&page=1";

        for _ in 0..500 {
            let reader = {
                let cache = Arc::clone(&cache);
                let version = Arc::clone(&version);
                tokio::spawn(async move {
                    cache
                        .get_or_render(key.to_string(), || async move {
                            let seen = version.load(Ordering::SeqCst);
                            tokio::task::yield_now().await;
                            Ok(json!(seen))
                        })
                        .await
                        .unwrap();
                })
            };
            let writer = {
                let cache = Arc::clone(&cache);
                let version = Arc::clone(&version);
                tokio::spawn(async move {
                    version.fetch_add(1, Ordering::SeqCst);
                    cache.revalidate("/dashboard/invoices");
                })
            };
            reader.await.unwrap();
            writer.await.unwrap();

            if let Some(page) = cache.get(key) {
                assert_eq!(*page, json!(version.load(Ordering::SeqCst)));
            }
        }
    }
}
