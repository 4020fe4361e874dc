use crate::services::cache::DEFAULT_MAX_PAGES;
use secrecy::Secret;
use serde::Deserialize;
use service_core::config::Config as CommonConfig;
use service_core::error::AppError;

#[derive(Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: CommonConfig,
    pub database: DatabaseConfig,
    pub auth_provider: AuthProviderConfig,
    #[serde(default)]
    pub page_cache: PageCacheConfig,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP collector endpoint; span export is disabled when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

#[derive(Deserialize, Clone)]
pub struct AuthProviderConfig {
    /// Base URL of the authentication provider (e.g., http://auth-service:3000).
    pub url: String,
    /// Sign-in strategy forwarded with every credential submission.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct PageCacheConfig {
    /// Rendered pages kept before the oldest is evicted; 0 disables caching.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl Default for PageCacheConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
        }
    }
}

fn default_max_pages() -> usize {
    DEFAULT_MAX_PAGES
}

fn default_service_name() -> String {
    "dashboard-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_run_migrations() -> bool {
    true
}

fn default_strategy() -> String {
    "credentials".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl DashboardConfig {
    /// Load `config/base.yaml` overlaid with `APP_` environment variables.
    pub fn load() -> Result<Self, AppError> {
        let base_path = std::env::current_dir()?;

        // Support running from the workspace root or from the crate directory.
        let configuration_directory = if base_path.ends_with("dashboard-service") {
            base_path.join("config")
        } else {
            base_path.join("dashboard-service").join("config")
        };

        service_core::config::load(&configuration_directory.join("base.yaml"))
    }
}
