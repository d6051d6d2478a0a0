//! Data carried by a single payment attempt and the payloads exchanged with
//! the tokenization widget.
//!
//! Serde names follow the widget's wire format (`transactionId`, `expm`,
//! `3D`, ...), so these types can cross the JS boundary unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PaymentError;

/// Identity of one payment attempt.
///
/// Either assigned by the merchant or generated locally. It is the only piece
/// of state that survives the 3DS redirect.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(String);

impl AttemptId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh, locally unique identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Externally visible status of the current attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// No attempt in flight, or waiting on the 3DS challenge.
    #[default]
    Pending,
    /// Card data submitted, waiting for the widget's answer.
    Processing,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }
}

/// The hosted card fields managed by the widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardField {
    CardNumber,
    Cvv,
}

impl CardField {
    /// Field name as the widget knows it.
    pub fn as_str(&self) -> &'static str {
        match self {
            CardField::CardNumber => "cardNumber",
            CardField::Cvv => "cvv",
        }
    }
}

impl fmt::Display for CardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-sensitive card metadata, only available after tokenization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardInfo {
    pub brand: String,
    #[serde(rename = "type")]
    pub card_type: String,
    pub usage: String,
    pub country: String,
    pub issuer: String,
}

impl CardInfo {
    /// Read card info from a `getCardInfo` callback payload.
    ///
    /// Accepts the info object itself or one nested under `cardInfo`.
    pub fn from_payload(payload: &serde_json::Value) -> Option<Self> {
        let inner = payload.get("cardInfo").unwrap_or(payload);
        if !inner.is_object() {
            return None;
        }
        serde_json::from_value(inner.clone()).ok()
    }
}

/// Payload of the widget's `success` event.
///
/// Both `transaction_id` and `redirect` are optional here: a response that
/// carries neither is malformed and is judged by the controller, not by
/// deserialization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecureFieldsSuccess {
    #[serde(rename = "transactionId", default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(rename = "cardInfo", default, skip_serializing_if = "Option::is_none")]
    pub card_info: Option<CardInfo>,
}

impl SecureFieldsSuccess {
    pub fn with_transaction(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: Some(transaction_id.into()),
            ..Self::default()
        }
    }

    pub fn with_redirect(redirect: impl Into<String>) -> Self {
        Self {
            redirect: Some(redirect.into()),
            ..Self::default()
        }
    }

    /// The redirect target, when present and non-empty.
    pub fn redirect_target(&self) -> Option<&str> {
        self.redirect.as_deref().filter(|r| !r.is_empty())
    }

    /// The transaction id, when present and non-empty.
    pub fn transaction(&self) -> Option<&str> {
        self.transaction_id.as_deref().filter(|t| !t.is_empty())
    }
}

/// A phone number as country code plus subscriber part.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    pub cc: String,
    pub subscriber: String,
}

impl Phone {
    pub fn new(cc: impl Into<String>, subscriber: impl Into<String>) -> Self {
        Self {
            cc: cc.into(),
            subscriber: subscriber.into(),
        }
    }
}

/// Cardholder details forwarded to the issuer for 3-D Secure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cardholder {
    pub cardholder_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<Phone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_phone: Option<Phone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_phone: Option<Phone>,
}

impl Cardholder {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            cardholder_name: name.into(),
            email: email.into(),
            mobile_phone: None,
            work_phone: None,
            home_phone: None,
        }
    }
}

/// The `3D` block of [`SubmitOptions`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreeDsOptions {
    pub cardholder: Cardholder,
}

/// Options for one `submit` call. Built once, never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOptions {
    /// Expiry month, 1-12.
    pub expm: u8,
    /// Expiry year, two or four digits as the shopper typed it.
    pub expy: u16,
    pub usage: String,
    #[serde(rename = "3D", default, skip_serializing_if = "Option::is_none")]
    pub three_ds: Option<ThreeDsOptions>,
}

impl SubmitOptions {
    /// Build options from an expiry date.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidOptions` if the month is outside 1-12.
    pub fn new(expm: u8, expy: u16, usage: impl Into<String>) -> Result<Self, PaymentError> {
        if !(1..=12).contains(&expm) {
            return Err(PaymentError::InvalidOptions {
                reason: format!("expiry month {} is out of range", expm),
            });
        }
        Ok(Self {
            expm,
            expy,
            usage: usage.into(),
            three_ds: None,
        })
    }

    /// Parse the expiry month and year as typed into the form.
    pub fn from_form(month: &str, year: &str, usage: impl Into<String>) -> Result<Self, PaymentError> {
        let expm = month.trim().parse::<u8>().map_err(|_| PaymentError::InvalidOptions {
            reason: format!("expiry month {:?} is not a number", month),
        })?;
        let expy = year.trim().parse::<u16>().map_err(|_| PaymentError::InvalidOptions {
            reason: format!("expiry year {:?} is not a number", year),
        })?;
        Self::new(expm, expy, usage)
    }

    pub fn with_cardholder(mut self, cardholder: Cardholder) -> Self {
        self.three_ds = Some(ThreeDsOptions { cardholder });
        self
    }
}

/// Card number state as reported by the widget.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardNumberField {
    pub length: u32,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

/// CVV state as reported by the widget.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvvField {
    pub length: u32,
    pub valid: bool,
    #[serde(default = "cvv_required_default")]
    pub required: bool,
}

fn cvv_required_default() -> bool {
    true
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFields {
    pub card_number: CardNumberField,
    pub cvv: CvvField,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationTrigger {
    #[serde(default)]
    pub trigger: String,
}

/// Payload of the widget's `validate` event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureFieldsValidationResponse {
    pub fields: ValidationFields,
    #[serde(default)]
    pub has_errors: bool,
    #[serde(default)]
    pub event: ValidationTrigger,
}
