//! Invoice form schema.
//!
//! Coerces the raw form into typed invoice fields. Failures are collected per
//! field into [`validator::ValidationErrors`] so every failing field is
//! reported at once, then flattened into the [`FieldErrors`] map the form
//! re-renders from.

use crate::models::{FieldErrors, InvoiceForm, InvoiceInput, InvoiceStatus};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::borrow::Cow;
use std::str::FromStr;
use validator::{Validate, ValidationError, ValidationErrors};

pub const AMOUNT_NOT_A_NUMBER: &str = "Expected number, received nan";
pub const AMOUNT_NOT_POSITIVE: &str = "Please enter an amount greater than $0.";
pub const AMOUNT_TOO_LARGE: &str = "Please enter a smaller amount.";

/// Validate an invoice form for the create and update actions.
///
/// `id` and `date` are not part of either form; the id comes from the route
/// and the date is assigned on insert.
pub fn validate_invoice_form(form: &InvoiceForm) -> Result<InvoiceInput, ValidationErrors> {
    let mut errors = match form.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };

    let amount = match coerce_amount(form.amount.as_deref()) {
        Ok(cents) => Some(cents),
        Err(error) => {
            errors.add("amount", error);
            None
        }
    };

    let status = match form.status.as_deref() {
        Some(raw) => match InvoiceStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                errors.add("status", invalid_status(raw));
                None
            }
        },
        // Reported by the `required` rule above.
        None => None,
    };

    match (form.customer_id.clone(), amount, status) {
        (Some(customer_id), Some(amount), Some(status)) if errors.is_empty() => Ok(InvoiceInput {
            customer_id,
            amount,
            status,
        }),
        _ => Err(errors),
    }
}

/// Coerce a raw amount into whole cents.
///
/// Blank input coerces to zero, which then fails the positivity rule.
fn coerce_amount(raw: Option<&str>) -> Result<i64, ValidationError> {
    let trimmed = raw.unwrap_or_default().trim();

    let amount = if trimmed.is_empty() {
        Decimal::ZERO
    } else if trimmed.contains('_') {
        // Digit separators are not numeric input.
        return Err(field_error("invalid_type", AMOUNT_NOT_A_NUMBER));
    } else {
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| field_error("invalid_type", AMOUNT_NOT_A_NUMBER))?
    };

    if amount <= Decimal::ZERO {
        return Err(field_error("too_small", AMOUNT_NOT_POSITIVE));
    }

    let cents = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|c| c.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|c| c.to_i64())
        .ok_or_else(|| field_error("too_big", AMOUNT_TOO_LARGE))?;

    // Sub-cent amounts round to nothing.
    if cents == 0 {
        return Err(field_error("too_small", AMOUNT_NOT_POSITIVE));
    }

    Ok(cents)
}

fn invalid_status(received: &str) -> ValidationError {
    let expected = InvoiceStatus::VARIANTS
        .iter()
        .map(|status| format!("'{}'", status.as_str()))
        .collect::<Vec<_>>()
        .join(" | ");

    let mut error = ValidationError::new("invalid_enum_value");
    error.message = Some(Cow::Owned(format!(
        "Invalid enum value. Expected {}, received '{}'",
        expected, received
    )));
    error.add_param(Cow::Borrowed("received"), &received);
    error
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Flatten validation errors into the form's field error map.
pub fn flatten_field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, field_errors)| {
            let messages = field_errors
                .iter()
                .map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string())
                })
                .collect();
            (form_field_name(&field), messages)
        })
        .collect()
}

/// `customer_id` -> `customerId`; names already in camelCase pass through.
fn form_field_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper_next = false;
    for ch in field.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            name.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            name.push(ch);
        }
    }
    name
}
