//! Domain models for dashboard-service.

mod form;
mod invoice;

pub use form::{FieldErrors, FormState, InvoiceForm};
pub use invoice::{
    Invoice, InvoiceInput, InvoiceStatus, ListInvoicesFilter, NewInvoice, INVOICES_PER_PAGE,
};
