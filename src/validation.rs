//! Validation interpreter.
//!
//! Turns the widget's `validate` payload into a pass/fail decision with
//! field-level detail. Pure: no widget or network access.

use serde::Serialize;

use crate::types::{CardField, CardNumberField, CvvField, SecureFieldsValidationResponse};

/// Result of interpreting one validation event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationState {
    pub card_number: CardNumberField,
    pub cvv: CvvField,
    /// Fields that block submission.
    pub invalid_fields: Vec<CardField>,
    /// True when either the widget or the local rule reports a problem.
    pub has_errors: bool,
    /// Name of the widget event that triggered validation.
    pub trigger: String,
}

impl ValidationState {
    pub fn is_valid(&self) -> bool {
        !self.has_errors
    }

    pub fn is_field_valid(&self, field: CardField) -> bool {
        !self.invalid_fields.contains(&field)
    }

    /// Card brand the widget inferred from the number, if any.
    pub fn payment_method(&self) -> Option<&str> {
        self.card_number.payment_method.as_deref()
    }
}

/// Interpret a validation payload.
///
/// The form is valid when the card number is valid and, if a CVV is
/// required, the CVV is valid too. The widget's own `hasErrors` flag is
/// OR-ed in, so an error from either source is never suppressed.
pub fn interpret(payload: &SecureFieldsValidationResponse) -> ValidationState {
    let card_number = payload.fields.card_number.clone();
    let cvv = payload.fields.cvv.clone();

    let mut invalid_fields = Vec::new();
    if !card_number.valid {
        invalid_fields.push(CardField::CardNumber);
    }
    if cvv.required && !cvv.valid {
        invalid_fields.push(CardField::Cvv);
    }

    ValidationState {
        has_errors: payload.has_errors || !invalid_fields.is_empty(),
        card_number,
        cvv,
        invalid_fields,
        trigger: payload.event.trigger.clone(),
    }
}
