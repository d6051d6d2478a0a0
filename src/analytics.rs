//! Analytics collaborator.
//!
//! Calls are fire-and-forget: the payment flow never depends on them
//! succeeding.

use serde_json::Value as JsonValue;

pub const PAYMENT_SUBMITTED: &str = "Payment Submitted";
pub const THREE_DS_STARTED: &str = "3DS Challenge Started";
pub const PAYMENT_SUCCEEDED: &str = "Payment Succeeded";
pub const PAYMENT_FAILED: &str = "Payment Failed";

pub trait Analytics {
    fn track(&self, event: &str, properties: JsonValue);
}

/// Analytics sink that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAnalytics;

impl Analytics for NoopAnalytics {
    fn track(&self, event: &str, _properties: JsonValue) {
        log::debug!("analytics disabled, dropping {:?}", event);
    }
}
