//! Persistence seam for invoice actions.

use crate::models::{Invoice, InvoiceInput, ListInvoicesFilter, NewInvoice};
use async_trait::async_trait;
use service_core::error::AppError;
use uuid::Uuid;

/// Invoice persistence. Every method is a single autocommitted statement.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<Invoice, AppError>;

    /// Replace customer, amount and status. `None` when no row has that id.
    async fn update_invoice(
        &self,
        id: Uuid,
        input: &InvoiceInput,
    ) -> Result<Option<Invoice>, AppError>;

    /// Returns the number of rows removed.
    async fn delete_invoice(&self, id: Uuid) -> Result<u64, AppError>;

    async fn get_invoice(&self, id: Uuid) -> Result<Option<Invoice>, AppError>;

    async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
