//! 3-D Secure redirect handling.
//!
//! Leaving for the challenge page discards all in-memory state, so the
//! attempt identity travels in the navigation target itself:
//!
//! ```text
//! {challengePath}?attemptId=<id>&redirect=<issuer url>
//! ```
//!
//! The challenge page reads it back with [`ChallengeContext::from_query`].
//! Once the issuer is done, the page is loaded again with the outcome added
//! (`status=success&transactionId=..` or `status=error&code=..&message=..`),
//! which the controller replays as a synthetic widget event.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, WidgetError};
use crate::navigation::Navigator;
use crate::outcome::OutcomeReport;
use crate::types::{AttemptId, SecureFieldsSuccess};
use crate::widget::WidgetEvent;

const DEFAULT_CHALLENGE_FAILURE: &str = "3-D Secure authentication failed.";

/// Navigation context of the challenge page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ChallengeContext {
    /// Parse a query string. An unreadable query yields an empty context,
    /// which settles as a lost attempt rather than failing the page.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        serde_urlencoded::from_str(query).unwrap_or_else(|e| {
            log::warn!("unreadable challenge context {:?}: {}", query, e);
            ChallengeContext::default()
        })
    }

    pub fn attempt_id(&self) -> Option<AttemptId> {
        self.attempt_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(AttemptId::new)
    }

    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref().filter(|r| !r.is_empty())
    }

    /// The challenge result as a synthetic widget event, if there is one yet.
    pub fn outcome(&self) -> Option<WidgetEvent> {
        let status = self.status.as_deref().filter(|s| !s.is_empty())?;
        let event = match status.to_ascii_lowercase().as_str() {
            "success" => WidgetEvent::Success(SecureFieldsSuccess {
                transaction_id: self.transaction_id.clone(),
                redirect: None,
                card_info: None,
            }),
            "error" | "failed" => WidgetEvent::Error(self.challenge_error(None)),
            "cancel" | "cancelled" => {
                WidgetEvent::Error(self.challenge_error(Some("challenge_cancelled")))
            }
            _ => WidgetEvent::Error(self.challenge_error(Some("unknown_challenge_status"))),
        };
        Some(event)
    }

    fn challenge_error(&self, fallback_code: Option<&str>) -> WidgetError {
        let message = self
            .message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_CHALLENGE_FAILURE.to_string());
        WidgetError {
            message,
            field: self.field.clone().filter(|f| !f.is_empty()),
            code: self
                .code
                .clone()
                .filter(|c| !c.is_empty())
                .or_else(|| fallback_code.map(str::to_string)),
        }
    }
}

/// What the challenge page should do after reading its context.
#[derive(Clone, Debug, PartialEq)]
pub enum ChallengeStep {
    /// Show the issuer's challenge; the page will be loaded again afterwards.
    Challenge { attempt_id: AttemptId, redirect: String },
    /// The attempt is settled.
    Settled(OutcomeReport),
}

/// Builds the challenge destination and reads the context back on arrival.
pub struct ThreeDsRedirectHandler {
    challenge_path: String,
    navigator: Rc<dyn Navigator>,
}

impl ThreeDsRedirectHandler {
    pub fn new(challenge_path: impl Into<String>, navigator: Rc<dyn Navigator>) -> Self {
        Self {
            challenge_path: challenge_path.into(),
            navigator,
        }
    }

    /// Challenge route carrying the attempt id and the issuer redirect.
    ///
    /// The redirect is passed through as-is; only its non-emptiness was checked.
    pub fn destination(&self, attempt_id: &AttemptId, redirect: &str) -> Result<String, PaymentError> {
        let context = ChallengeContext {
            attempt_id: Some(attempt_id.to_string()),
            redirect: Some(redirect.to_string()),
            ..ChallengeContext::default()
        };
        let query = serde_urlencoded::to_string(&context)
            .map_err(|e| PaymentError::Navigation(e.to_string()))?;
        let separator = if self.challenge_path.contains('?') { '&' } else { '?' };
        Ok(format!("{}{}{}", self.challenge_path, separator, query))
    }

    /// Navigate to the challenge page. The current page is abandoned.
    pub fn hand_off(&self, attempt_id: &AttemptId, redirect: &str) -> Result<(), PaymentError> {
        let destination = self.destination(attempt_id, redirect)?;
        log::info!("attempt {} leaving for 3-D Secure challenge", attempt_id);
        self.navigator.navigate(&destination)
    }

    /// Read the navigation context of the current page.
    pub fn read_context(&self) -> ChallengeContext {
        ChallengeContext::from_query(&self.navigator.query())
    }
}
