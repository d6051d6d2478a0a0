//! Outcome reporter: a read-only view of the current attempt for the
//! surrounding UI and collaborators.

use serde::Serialize;

use crate::controller::SubmissionController;
use crate::error::{ErrorKind, PaymentError};
use crate::types::{AttemptId, CardInfo, PaymentStatus};

/// Error as exposed to collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl From<&PaymentError> for ReportedError {
    fn from(err: &PaymentError) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
            code: err.code().map(str::to_string),
            field: err.field().map(str::to_string),
        }
    }
}

/// Snapshot of the attempt's externally visible state.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeReport {
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_id: Option<AttemptId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_info: Option<CardInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReportedError>,
}

impl OutcomeReport {
    pub fn is_settled(&self) -> bool {
        matches!(self.status, PaymentStatus::Success | PaymentStatus::Failed)
    }
}

/// Borrowing view over a controller. Never mutates it.
pub struct OutcomeReporter<'a> {
    controller: &'a SubmissionController,
}

impl<'a> OutcomeReporter<'a> {
    pub fn new(controller: &'a SubmissionController) -> Self {
        Self { controller }
    }

    pub fn status(&self) -> PaymentStatus {
        self.controller
            .attempt()
            .map(|a| a.status)
            .unwrap_or_default()
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.controller.attempt().and_then(|a| a.transaction_id.as_deref())
    }

    /// The settling error, only while the attempt is failed.
    pub fn error(&self) -> Option<&PaymentError> {
        self.controller
            .attempt()
            .filter(|a| a.status == PaymentStatus::Failed)
            .and_then(|a| a.error.as_ref())
    }

    pub fn report(&self) -> OutcomeReport {
        let attempt = self.controller.attempt();
        OutcomeReport {
            status: self.status(),
            attempt_id: attempt.map(|a| a.id.clone()),
            transaction_id: self.transaction_id().map(str::to_string),
            card_info: attempt.and_then(|a| a.card_info.clone()),
            error: self.error().map(ReportedError::from),
        }
    }
}
