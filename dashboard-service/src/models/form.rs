//! Form payloads and the state returned to re-render a form.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// Field name -> validation messages, keyed by the form's field names.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Raw invoice form as submitted by the browser.
///
/// Every field is optional here so that missing fields surface as field
/// errors instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct InvoiceForm {
    #[serde(rename = "customerId", default, deserialize_with = "empty_string_as_none")]
    #[validate(required(message = "Please select a customer"))]
    pub customer_id: Option<String>,

    #[serde(default)]
    pub amount: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(required(message = "Please select an invoice status."))]
    pub status: Option<String>,
}

impl InvoiceForm {
    pub fn new(customer_id: &str, amount: &str, status: &str) -> Self {
        Self {
            customer_id: Some(customer_id.to_string()),
            amount: Some(amount.to_string()),
            status: Some(status.to_string()),
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// State handed back to the form after a failed action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(default)]
    pub message: Option<String>,
}

impl FormState {
    pub fn with_errors(errors: FieldErrors, message: impl Into<String>) -> Self {
        Self {
            errors: Some(errors),
            message: Some(message.into()),
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            errors: None,
            message: Some(message.into()),
        }
    }
}
