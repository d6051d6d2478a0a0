//! Page routing collaborator.

use crate::error::PaymentError;

/// Full-page navigation and access to the current location's query string.
pub trait Navigator {
    /// Leave the current page. On success the current execution context is
    /// gone; nothing after this call should assume it continues.
    fn navigate(&self, destination: &str) -> Result<(), PaymentError>;

    /// Query string of the current location, with or without the leading `?`.
    fn query(&self) -> String;
}
