//! Services module for dashboard-service.

pub mod auth_provider;
pub mod cache;
pub mod database;
pub mod metrics;
pub mod store;

pub use auth_provider::{AuthErrorKind, AuthProvider, Credentials, HttpAuthProvider, SignIn, SignInError};
pub use cache::{PageCache, RouteCache};
pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
pub use store::InvoiceStore;
