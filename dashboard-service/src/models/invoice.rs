//! Invoice model for dashboard-service.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Invoices shown per page of the invoice list.
pub const INVOICES_PER_PAGE: i64 = 6;

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub const VARIANTS: [InvoiceStatus; 2] = [InvoiceStatus::Pending, InvoiceStatus::Paid];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }

    /// Strict parse with no fallback variant.
    pub fn parse(s: &str) -> Option<Self> {
        Self::VARIANTS.into_iter().find(|status| status.as_str() == s)
    }
}

/// Invoice row as stored in the `invoices` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Amount in cents.
    pub amount: i64,
    pub status: String,
    pub date: NaiveDate,
}

impl Invoice {
    /// Amount in currency units, as the edit form displays it.
    pub fn amount_in_currency(&self) -> Decimal {
        Decimal::new(self.amount, 2)
    }
}

/// Validated invoice fields shared by the create and update forms.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceInput {
    pub customer_id: String,
    /// Amount in cents.
    pub amount: i64,
    pub status: InvoiceStatus,
}

/// Input for inserting an invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub customer_id: String,
    pub amount: i64,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

impl NewInvoice {
    pub fn dated(input: InvoiceInput, date: NaiveDate) -> Self {
        Self {
            customer_id: input.customer_id,
            amount: input.amount,
            status: input.status,
            date,
        }
    }
}

/// Filter parameters for listing invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListInvoicesFilter {
    #[serde(default)]
    pub query: String,
    #[serde(default = "first_page")]
    pub page: i64,
}

fn first_page() -> i64 {
    1
}

impl ListInvoicesFilter {
    /// Rows to skip. Saturates for page numbers past the last representable row.
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(INVOICES_PER_PAGE)
    }

    /// Cache key for the list route this filter renders.
    pub fn cache_key(&self, route: &str) -> String {
        format!("{}?query={}&page={}", route, self.query, self.page.max(1))
    }
}
