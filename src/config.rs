//! Checkout configuration.
//!
//! Loaded from JSON (camelCase keys) or built in code, then validated once
//! before the widget is initialized.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PaymentError;
use crate::types::CardField;

pub const DEFAULT_USAGE: &str = "SIMPLE";
pub const DEFAULT_CHALLENGE_PATH: &str = "/3ds";
pub const DEFAULT_SCRIPT_SRC: &str =
    "https://pay.sandbox.datatrans.com/upp/payment/js/secure-fields-2.0.0.min.js";

/// Ids of the DOM containers the widget renders its hosted fields into.
///
/// Serializes to the `fields` object `initTokenize` expects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    pub card_number: String,
    pub cvv: String,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            card_number: "card-number-placeholder".to_string(),
            cvv: "cvv-placeholder".to_string(),
        }
    }
}

impl FieldConfig {
    pub fn container(&self, field: CardField) -> &str {
        match field {
            CardField::CardNumber => &self.card_number,
            CardField::Cvv => &self.cvv,
        }
    }
}

/// Everything the checkout needs to know about the merchant and the page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutConfig {
    pub merchant_id: u64,
    #[serde(default)]
    pub fields: FieldConfig,
    /// Placeholder text per hosted field.
    #[serde(default)]
    pub placeholders: BTreeMap<CardField, String>,
    #[serde(default = "default_usage")]
    pub usage: String,
    /// Route of the 3-D Secure challenge page.
    #[serde(default = "default_challenge_path")]
    pub challenge_path: String,
    /// URL of the widget script.
    #[serde(default = "default_script_src")]
    pub script_src: String,
}

fn default_usage() -> String {
    DEFAULT_USAGE.to_string()
}

fn default_challenge_path() -> String {
    DEFAULT_CHALLENGE_PATH.to_string()
}

fn default_script_src() -> String {
    DEFAULT_SCRIPT_SRC.to_string()
}

impl CheckoutConfig {
    pub fn new(merchant_id: u64) -> Self {
        Self {
            merchant_id,
            fields: FieldConfig::default(),
            placeholders: BTreeMap::new(),
            usage: default_usage(),
            challenge_path: default_challenge_path(),
            script_src: default_script_src(),
        }
    }

    pub fn with_placeholder(mut self, field: CardField, text: impl Into<String>) -> Self {
        self.placeholders.insert(field, text.into());
        self
    }

    pub fn with_challenge_path(mut self, path: impl Into<String>) -> Self {
        self.challenge_path = path.into();
        self
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, PaymentError> {
        let config: CheckoutConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.merchant_id == 0 {
            return Err(PaymentError::Config("merchantId must be non-zero".into()));
        }
        if self.fields.card_number.is_empty() || self.fields.cvv.is_empty() {
            return Err(PaymentError::Config(
                "fields.cardNumber and fields.cvv must name a container".into(),
            ));
        }
        if !self.challenge_path.starts_with('/') {
            return Err(PaymentError::Config(format!(
                "challengePath {:?} must start with '/'",
                self.challenge_path
            )));
        }
        if self.usage.is_empty() {
            return Err(PaymentError::Config("usage must not be empty".into()));
        }
        Ok(())
    }
}
