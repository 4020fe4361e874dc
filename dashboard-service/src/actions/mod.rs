//! Form actions: one submitted form in, one statement or provider call out.

mod authenticate;
mod invoices;

pub use authenticate::{
    authenticate, Authentication, INVALID_CREDENTIALS, SOMETHING_WENT_WRONG,
};
pub use invoices::{
    ActionError, InvoiceActions, CREATE_DATABASE_ERROR, CREATE_MISSING_FIELDS,
    DELETE_DATABASE_ERROR, UPDATE_DATABASE_ERROR, UPDATE_MISSING_FIELDS,
};

/// Invoice list route; revalidated and redirected to after mutations.
pub const INVOICES_ROUTE: &str = "/dashboard/invoices";
