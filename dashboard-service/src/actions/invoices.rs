use crate::actions::INVOICES_ROUTE;
use crate::models::{FieldErrors, FormState, Invoice, InvoiceForm, NewInvoice};
use crate::schema::{flatten_field_errors, validate_invoice_form};
use crate::services::metrics::record_action;
use crate::services::{InvoiceStore, PageCache};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;
use validator::ValidationErrors;

pub const CREATE_MISSING_FIELDS: &str = "Missing Fields. Failed to Create Invoice.";
pub const UPDATE_MISSING_FIELDS: &str = "Missing Fields. Failed to Update Invoice.";
pub const CREATE_DATABASE_ERROR: &str = "Database Error: Failed to Create Invoice.";
pub const UPDATE_DATABASE_ERROR: &str = "Database Error: Failed to Update Invoice.";
pub const DELETE_DATABASE_ERROR: &str = "Database Error: Failed to Delete Invoice.";
const INVOICE_NOT_FOUND: &str = "Invoice not found.";

/// Failure of an invoice mutation, rendered back into the form.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{message}")]
    Validation {
        errors: FieldErrors,
        message: &'static str,
    },

    #[error("{message}")]
    Persistence {
        message: &'static str,
        #[source]
        source: AppError,
    },

    #[error("Invoice {id} not found")]
    NotFound { id: Uuid },
}

impl ActionError {
    fn invalid(errors: &ValidationErrors, message: &'static str) -> Self {
        ActionError::Validation {
            errors: flatten_field_errors(errors),
            message,
        }
    }

    pub fn form_state(&self) -> FormState {
        match self {
            ActionError::Validation { errors, message } => {
                FormState::with_errors(errors.clone(), *message)
            }
            ActionError::Persistence { message, .. } => FormState::with_message(*message),
            ActionError::NotFound { .. } => FormState::with_message(INVOICE_NOT_FOUND),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ActionError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ActionError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ActionError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.form_state())).into_response()
    }
}

/// Create, update and delete actions for invoices.
///
/// Each successful mutation revalidates [`INVOICES_ROUTE`]; create and update
/// callers then navigate to [`InvoiceActions::redirect_target`].
pub struct InvoiceActions {
    store: Arc<dyn InvoiceStore>,
    cache: Arc<dyn PageCache>,
}

impl InvoiceActions {
    pub fn new(store: Arc<dyn InvoiceStore>, cache: Arc<dyn PageCache>) -> Self {
        Self { store, cache }
    }

    pub fn redirect_target(&self) -> &'static str {
        INVOICES_ROUTE
    }

    #[instrument(skip(self, form))]
    pub async fn create_invoice(&self, form: &InvoiceForm) -> Result<Invoice, ActionError> {
        let input = validate_invoice_form(form).map_err(|errors| {
            record_action("create_invoice", "invalid");
            ActionError::invalid(&errors, CREATE_MISSING_FIELDS)
        })?;

        let invoice = NewInvoice::dated(input, Utc::now().date_naive());
        let created = self.store.insert_invoice(&invoice).await.map_err(|source| {
            error!(error = %source, "Failed to create invoice");
            record_action("create_invoice", "database_error");
            ActionError::Persistence {
                message: CREATE_DATABASE_ERROR,
                source,
            }
        })?;

        self.cache.revalidate(INVOICES_ROUTE);
        record_action("create_invoice", "success");
        info!(invoice_id = %created.id, "Invoice created from form");

        Ok(created)
    }

    #[instrument(skip(self, form), fields(invoice_id = %id))]
    pub async fn update_invoice(&self, id: Uuid, form: &InvoiceForm) -> Result<Invoice, ActionError> {
        let input = validate_invoice_form(form).map_err(|errors| {
            record_action("update_invoice", "invalid");
            ActionError::invalid(&errors, UPDATE_MISSING_FIELDS)
        })?;

        let updated = self
            .store
            .update_invoice(id, &input)
            .await
            .map_err(|source| {
                error!(error = %source, "Failed to update invoice");
                record_action("update_invoice", "database_error");
                ActionError::Persistence {
                    message: UPDATE_DATABASE_ERROR,
                    source,
                }
            })?
            .ok_or_else(|| {
                record_action("update_invoice", "not_found");
                ActionError::NotFound { id }
            })?;

        self.cache.revalidate(INVOICES_ROUTE);
        record_action("update_invoice", "success");
        info!("Invoice updated from form");

        Ok(updated)
    }

    /// Delete by id. Deleting an id that no longer exists still succeeds.
    #[instrument(skip(self), fields(invoice_id = %id))]
    pub async fn delete_invoice(&self, id: Uuid) -> Result<(), ActionError> {
        let removed = self.store.delete_invoice(id).await.map_err(|source| {
            error!(error = %source, "Failed to delete invoice");
            record_action("delete_invoice", "database_error");
            ActionError::Persistence {
                message: DELETE_DATABASE_ERROR,
                source,
            }
        })?;

        if removed == 0 {
            debug!("No invoice matched delete");
        }

        self.cache.revalidate(INVOICES_ROUTE);
        record_action("delete_invoice", "success");

        Ok(())
    }
}
