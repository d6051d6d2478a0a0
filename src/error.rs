//! Error types for the payment flow.
//!
//! [`WidgetError`] is the one shape every widget failure is normalized into.
//! [`PaymentError`] is what the controller settles an attempt with and what
//! fallible operations return.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::types::AttemptId;

/// Message used when the widget reports a failure without any text.
pub const GENERIC_WIDGET_MESSAGE: &str = "The card could not be processed.";

/// A card or tokenization failure reported by the widget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct WidgetError {
    /// Human-readable message.
    pub message: String,
    /// Offending card field, e.g. `"cardNumber"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Machine-readable code, e.g. `"invalid_card"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Detail block some widget errors nest under `data`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorDetail {
    message: Option<String>,
    field: Option<String>,
    code: Option<String>,
}

/// Union of every object shape the widget has been seen to emit.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawWidgetError {
    data: Option<ErrorDetail>,
    message: Option<String>,
    field: Option<String>,
    code: Option<String>,
    error: Option<JsonValue>,
}

impl WidgetError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Normalize an error payload emitted by the widget.
    ///
    /// Accepted shapes:
    /// - a bare string: `"Card declined"`
    /// - a flat object: `{ message, field, code }`
    /// - a nested object: `{ data: { message, field, code } }`
    /// - a wrapped error: `{ error: "..." }` or `{ error: { message, ... } }`
    ///
    /// When a value is present both under `data` and at the top level, the
    /// `data` value wins. Anything unrecognized becomes a generic error.
    pub fn from_payload(payload: &JsonValue) -> Self {
        match payload {
            JsonValue::String(message) if !message.is_empty() => Self::new(message.clone()),
            JsonValue::Object(_) => {
                let raw: RawWidgetError =
                    serde_json::from_value(payload.clone()).unwrap_or_default();
                Self::from_raw(raw)
            }
            _ => Self::new(GENERIC_WIDGET_MESSAGE),
        }
    }

    fn from_raw(raw: RawWidgetError) -> Self {
        let detail = raw.data.unwrap_or_default();
        let nested = match raw.error {
            Some(object @ JsonValue::Object(_)) => {
                serde_json::from_value::<ErrorDetail>(object).unwrap_or_default()
            }
            Some(JsonValue::String(message)) => ErrorDetail {
                message: Some(message),
                ..ErrorDetail::default()
            },
            _ => ErrorDetail::default(),
        };

        let message = non_empty(detail.message)
            .or_else(|| non_empty(raw.message))
            .or_else(|| non_empty(nested.message))
            .unwrap_or_else(|| GENERIC_WIDGET_MESSAGE.to_string());

        Self {
            message,
            field: non_empty(detail.field)
                .or_else(|| non_empty(raw.field))
                .or_else(|| non_empty(nested.field)),
            code: non_empty(detail.code)
                .or_else(|| non_empty(raw.code))
                .or_else(|| non_empty(nested.code)),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Machine-readable category of a [`PaymentError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    AdapterInit,
    Widget,
    DuplicateSubmission,
    MalformedSuccessResponse,
    LostAttemptContext,
    NotReady,
    InvalidOptions,
    Config,
    Navigation,
    Bridge,
}

/// Every failure the payment flow can produce.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// The widget was set up twice, or used before being set up.
    #[error("tokenization widget setup failed: {reason}")]
    AdapterInit { reason: String },

    /// Card or tokenization failure from the widget.
    #[error("widget error: {0}")]
    Widget(#[from] WidgetError),

    /// A submission was requested while another attempt is in flight.
    #[error("payment attempt {attempt_id} is already in flight")]
    DuplicateSubmission { attempt_id: AttemptId },

    /// The success event carried neither a transaction id nor a redirect.
    #[error("success response carried neither transactionId nor redirect")]
    MalformedSuccessResponse,

    /// The challenge page was reached without a recoverable attempt id.
    #[error("returned from 3-D Secure without an attempt identifier")]
    LostAttemptContext,

    /// Submit was requested while the card fields are not valid.
    #[error("payment form is not ready: {reason}")]
    NotReady { reason: String },

    /// Submit options could not be built from the form input.
    #[error("invalid submit options: {reason}")]
    InvalidOptions { reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    /// A JS call or a JS <-> Rust conversion failed.
    #[error("browser bridge error: {0}")]
    Bridge(String),
}

impl PaymentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::AdapterInit { .. } => ErrorKind::AdapterInit,
            PaymentError::Widget(_) => ErrorKind::Widget,
            PaymentError::DuplicateSubmission { .. } => ErrorKind::DuplicateSubmission,
            PaymentError::MalformedSuccessResponse => ErrorKind::MalformedSuccessResponse,
            PaymentError::LostAttemptContext => ErrorKind::LostAttemptContext,
            PaymentError::NotReady { .. } => ErrorKind::NotReady,
            PaymentError::InvalidOptions { .. } => ErrorKind::InvalidOptions,
            PaymentError::Config(_) => ErrorKind::Config,
            PaymentError::Navigation(_) => ErrorKind::Navigation,
            PaymentError::Bridge(_) => ErrorKind::Bridge,
        }
    }

    /// Machine-readable code exposed to the outcome reporter.
    pub fn code(&self) -> Option<&str> {
        match self {
            PaymentError::Widget(err) => err.code.as_deref(),
            PaymentError::MalformedSuccessResponse => Some("malformed_response"),
            PaymentError::LostAttemptContext => Some("lost_attempt_context"),
            _ => None,
        }
    }

    /// Offending field, when the widget named one.
    pub fn field(&self) -> Option<&str> {
        match self {
            PaymentError::Widget(err) => err.field.as_deref(),
            _ => None,
        }
    }

    /// Text suitable for showing to the shopper.
    pub fn user_message(&self) -> String {
        match self {
            PaymentError::Widget(err) => err.message.clone(),
            PaymentError::LostAttemptContext => {
                "Payment session was lost, please retry payment.".to_string()
            }
            PaymentError::DuplicateSubmission { .. } => {
                "A payment is already being processed.".to_string()
            }
            PaymentError::NotReady { .. } => "Please check your card details.".to_string(),
            PaymentError::InvalidOptions { .. } => "Please check the card expiry date.".to_string(),
            _ => "Payment failed, please retry payment.".to_string(),
        }
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(err: serde_json::Error) -> Self {
        PaymentError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::bare_string(json!("Card declined"), "Card declined", None, None)]
    #[case::flat(
        json!({ "message": "Invalid card", "field": "cardNumber", "code": "invalid_card" }),
        "Invalid card", Some("cardNumber"), Some("invalid_card")
    )]
    #[case::nested(
        json!({ "data": { "message": "CVV missing", "field": "cvv", "code": "cvv_required" } }),
        "CVV missing", Some("cvv"), Some("cvv_required")
    )]
    #[case::wrapped_string(json!({ "error": "Network unavailable" }), "Network unavailable", None, None)]
    #[case::wrapped_object(
        json!({ "error": { "message": "Expired", "code": "expired_card" } }),
        "Expired", None, Some("expired_card")
    )]
    #[case::code_only(json!({ "code": "invalid_card" }), GENERIC_WIDGET_MESSAGE, None, Some("invalid_card"))]
    #[case::unknown(json!(42), GENERIC_WIDGET_MESSAGE, None, None)]
    #[case::empty_string(json!(""), GENERIC_WIDGET_MESSAGE, None, None)]
    fn normalizes_widget_error_shapes(
        #[case] payload: JsonValue,
        #[case] message: &str,
        #[case] field: Option<&str>,
        #[case] code: Option<&str>,
    ) {
        let err = WidgetError::from_payload(&payload);
        assert_eq!(err.message, message);
        assert_eq!(err.field.as_deref(), field);
        assert_eq!(err.code.as_deref(), code);
    }

    #[test]
    fn data_block_takes_precedence_over_top_level() {
        let err = WidgetError::from_payload(&json!({
            "field": "cvv",
            "message": "top",
            "data": { "field": "cardNumber", "code": "invalid_card" }
        }));
        assert_eq!(err.field.as_deref(), Some("cardNumber"));
        assert_eq!(err.code.as_deref(), Some("invalid_card"));
        // data had no message, so the top-level one fills the gap
        assert_eq!(err.message, "top");
    }

    #[test]
    fn kinds_and_codes() {
        let widget = PaymentError::from(WidgetError::new("nope").with_code("invalid_card"));
        assert_eq!(widget.kind(), ErrorKind::Widget);
        assert_eq!(widget.code(), Some("invalid_card"));

        assert_eq!(PaymentError::LostAttemptContext.kind(), ErrorKind::LostAttemptContext);
        assert!(PaymentError::LostAttemptContext
            .user_message()
            .contains("please retry payment"));
        assert_eq!(
            PaymentError::MalformedSuccessResponse.code(),
            Some("malformed_response")
        );
    }
}
