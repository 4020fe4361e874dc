use crate::actions::INVOICES_ROUTE;
use crate::models::{Invoice, InvoiceForm, ListInvoicesFilter};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use service_core::error::AppError;
use uuid::Uuid;

/// Invoice as the edit form displays it.
#[derive(Debug, Serialize)]
pub struct InvoiceEditView {
    pub id: Uuid,
    #[serde(rename = "customerId")]
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub status: String,
    pub date: String,
}

impl From<&Invoice> for InvoiceEditView {
    fn from(invoice: &Invoice) -> Self {
        Self {
            id: invoice.id,
            customer_id: invoice.customer_id,
            amount: invoice.amount_in_currency(),
            status: invoice.status.clone(),
            date: invoice.date.format("%Y-%m-%d").to_string(),
        }
    }
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(filter): Query<ListInvoicesFilter>,
) -> Result<Response, AppError> {
    let key = filter.cache_key(INVOICES_ROUTE);
    let store = state.store.clone();

    let page = state
        .cache
        .get_or_render(key, || async move {
            let invoices = store.list_invoices(&filter).await?;
            Ok(json!({
                "invoices": invoices,
                "query": filter.query,
                "page": filter.page.max(1),
            }))
        })
        .await?;

    Ok(Json(page.as_ref().clone()).into_response())
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let key = format!("{}/{}", INVOICES_ROUTE, id);
    let store = state.store.clone();

    let page = state
        .cache
        .get_or_render(key, || async move {
            let invoice = store
                .get_invoice(id)
                .await?
                .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
            Ok(json!({ "invoice": InvoiceEditView::from(&invoice) }))
        })
        .await?;

    Ok(Json(page.as_ref().clone()).into_response())
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Form(form): Form<InvoiceForm>,
) -> Response {
    match state.actions.create_invoice(&form).await {
        Ok(_) => Redirect::to(state.actions.redirect_target()).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<InvoiceForm>,
) -> Response {
    match state.actions.update_invoice(id, &form).await {
        Ok(_) => Redirect::to(state.actions.redirect_target()).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_invoice(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.actions.delete_invoice(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
