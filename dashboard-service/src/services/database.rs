//! PostgreSQL-backed invoice store.

use crate::models::{Invoice, InvoiceInput, ListInvoicesFilter, NewInvoice, INVOICES_PER_PAGE};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::InvoiceStore;
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "dashboard-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for Database {
    #[instrument(skip(self, invoice), fields(customer_id = %invoice.customer_id))]
    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_invoice"])
            .start_timer();

        let created = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (customer_id, amount, status, date)
            VALUES ($1::uuid, $2, $3, $4)
            RETURNING id, customer_id, amount, status, date
            "#,
        )
        .bind(&invoice.customer_id)
        .bind(invoice.amount)
        .bind(invoice.status.as_str())
        .bind(invoice.date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert invoice: {}", e)))?;

        timer.observe_duration();

        info!(invoice_id = %created.id, amount = created.amount, "Invoice created");

        Ok(created)
    }

    #[instrument(skip(self, input), fields(invoice_id = %id))]
    async fn update_invoice(
        &self,
        id: Uuid,
        input: &InvoiceInput,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice"])
            .start_timer();

        let updated = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET customer_id = $1::uuid, amount = $2, status = $3
            WHERE id = $4
            RETURNING id, customer_id, amount, status, date
            "#,
        )
        .bind(&input.customer_id)
        .bind(input.amount)
        .bind(input.status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        timer.observe_duration();

        Ok(updated)
    }

    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn delete_invoice(&self, id: Uuid) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_invoice"])
            .start_timer();

        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete invoice: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn get_invoice(&self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, customer_id, amount, status, date
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self))]
    async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let pattern = format!("%{}%", filter.query);
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, customer_id, amount, status, date
            FROM invoices
            WHERE customer_id::text ILIKE $1
               OR amount::text ILIKE $1
               OR date::text ILIKE $1
               OR status ILIKE $1
            ORDER BY date DESC, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern)
        .bind(INVOICES_PER_PAGE)
        .bind(filter.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        debug!(count = invoices.len(), "Invoices listed");

        Ok(invoices)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}
