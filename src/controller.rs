//! Submission controller: the state machine behind one payment attempt.
//!
//! ```text
//! idle -> validating -> ready -> submitting -> settled(success | failed)
//!              |                      |
//!              +-> idle               +-> threeDsPending -> settled(*)
//! ```
//!
//! The controller is the only owner of the active [`PaymentAttempt`]. Every
//! failure is terminal for the attempt; nothing is retried automatically.

use std::fmt;
use std::rc::Rc;

use serde_json::json;

use crate::analytics::{self, Analytics};
use crate::error::{PaymentError, WidgetError};
use crate::outcome::{OutcomeReport, OutcomeReporter};
use crate::three_ds::{ChallengeStep, ThreeDsRedirectHandler};
use crate::types::{AttemptId, CardInfo, PaymentStatus, SecureFieldsSuccess, SecureFieldsValidationResponse, SubmitOptions};
use crate::validation::{interpret, ValidationState};
use crate::widget::{WidgetAdapter, WidgetEvent};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settlement {
    Success,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Validating,
    Ready,
    Submitting,
    ThreeDsPending,
    Settled(Settlement),
}

impl SubmissionState {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Validating => "validating",
            SubmissionState::Ready => "ready",
            SubmissionState::Submitting => "submitting",
            SubmissionState::ThreeDsPending => "threeDsPending",
            SubmissionState::Settled(Settlement::Success) => "settled(success)",
            SubmissionState::Settled(Settlement::Failed) => "settled(failed)",
        }
    }

    /// True while an attempt is waiting on the widget or the issuer.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubmissionState::Submitting | SubmissionState::ThreeDsPending)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, SubmissionState::Settled(_))
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One user-initiated submission cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentAttempt {
    pub id: AttemptId,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub redirect: Option<String>,
    pub card_info: Option<CardInfo>,
    pub error: Option<PaymentError>,
}

impl PaymentAttempt {
    fn new(id: AttemptId, status: PaymentStatus) -> Self {
        Self {
            id,
            status,
            transaction_id: None,
            redirect: None,
            card_info: None,
            error: None,
        }
    }
}

pub struct SubmissionController {
    state: SubmissionState,
    attempt: Option<PaymentAttempt>,
    validation: Option<ValidationState>,
    field_error: Option<WidgetError>,
    widget: Option<Rc<WidgetAdapter>>,
    analytics: Rc<dyn Analytics>,
    redirect: ThreeDsRedirectHandler,
}

impl SubmissionController {
    pub fn new(analytics: Rc<dyn Analytics>, redirect: ThreeDsRedirectHandler) -> Self {
        Self {
            state: SubmissionState::Idle,
            attempt: None,
            validation: None,
            field_error: None,
            widget: None,
            analytics,
            redirect,
        }
    }

    /// Attach the widget used for submission. The challenge page runs without one.
    pub fn with_widget(mut self, widget: Rc<WidgetAdapter>) -> Self {
        self.widget = Some(widget);
        self
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn attempt(&self) -> Option<&PaymentAttempt> {
        self.attempt.as_ref()
    }

    /// Outcome of the last validation event, if any.
    pub fn validation(&self) -> Option<&ValidationState> {
        self.validation.as_ref()
    }

    /// Widget error reported while no submission was in flight.
    pub fn field_error(&self) -> Option<&WidgetError> {
        self.field_error.as_ref()
    }

    pub fn reporter(&self) -> OutcomeReporter<'_> {
        OutcomeReporter::new(self)
    }

    pub fn outcome(&self) -> OutcomeReport {
        self.reporter().report()
    }

    /// Process one widget event, in delivery order.
    pub fn handle_event(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::Validation(payload) => self.on_validation(&payload),
            WidgetEvent::Error(err) => self.on_error(err),
            WidgetEvent::Success(success) => self.on_success(success),
        }
    }

    pub fn on_validation(&mut self, payload: &SecureFieldsValidationResponse) {
        if self.state.is_in_flight() || self.state.is_settled() {
            log::debug!("validation event ignored while {}", self.state);
            return;
        }

        self.transition(SubmissionState::Validating);
        let validation = interpret(payload);
        self.field_error = None;
        let next = if validation.is_valid() {
            SubmissionState::Ready
        } else {
            log::debug!("card fields invalid: {:?}", validation.invalid_fields);
            SubmissionState::Idle
        };
        self.validation = Some(validation);
        self.transition(next);
    }

    /// Start an attempt with a locally generated id.
    pub fn submit(&mut self, options: SubmitOptions) -> Result<AttemptId, PaymentError> {
        self.submit_as(AttemptId::generate(), options)
    }

    /// Start an attempt with a merchant-assigned id.
    ///
    /// # Errors
    ///
    /// - `DuplicateSubmission` while another attempt is in flight; that
    ///   attempt is left untouched.
    /// - `NotReady` unless the last validation passed.
    /// - `AdapterInit` without an attached, initialized widget.
    /// - Any error from handing the options to the widget; the attempt is
    ///   then settled as failed.
    pub fn submit_as(&mut self, id: AttemptId, options: SubmitOptions) -> Result<AttemptId, PaymentError> {
        if let Some(active) = self.in_flight_attempt() {
            log::warn!("submission rejected, attempt {} is still {}", active, self.state);
            return Err(PaymentError::DuplicateSubmission { attempt_id: active });
        }
        if self.state != SubmissionState::Ready {
            return Err(PaymentError::NotReady {
                reason: format!("cannot submit while {}", self.state),
            });
        }
        let widget = self.widget.clone().ok_or_else(|| PaymentError::AdapterInit {
            reason: "no tokenization widget attached".into(),
        })?;

        self.attempt = Some(PaymentAttempt::new(id.clone(), PaymentStatus::Processing));
        self.transition(SubmissionState::Submitting);
        self.analytics
            .track(analytics::PAYMENT_SUBMITTED, json!({ "attemptId": id }));

        if let Err(e) = widget.submit(&options) {
            self.settle_failed(e.clone());
            return Err(e);
        }
        Ok(id)
    }

    pub fn on_success(&mut self, success: SecureFieldsSuccess) {
        match self.state {
            SubmissionState::Submitting => self.complete_submission(success),
            SubmissionState::ThreeDsPending => self.complete_challenge(success),
            _ => log::debug!("success event ignored while {}", self.state),
        }
    }

    pub fn on_error(&mut self, err: WidgetError) {
        match self.state {
            SubmissionState::Submitting | SubmissionState::ThreeDsPending => {
                self.settle_failed(PaymentError::Widget(err))
            }
            SubmissionState::Settled(_) => {
                log::debug!("error event ignored while {}: {}", self.state, err)
            }
            _ => {
                log::warn!("widget reported an error outside a submission: {}", err);
                self.field_error = Some(err);
                self.transition(SubmissionState::Idle);
            }
        }
    }

    /// Attach card metadata to the current attempt, whichever order it
    /// arrives in relative to the success event.
    pub fn record_card_info(&mut self, card_info: Option<CardInfo>) {
        let Some(card_info) = card_info else {
            log::debug!("card info callback carried no data");
            return;
        };
        match self.attempt.as_mut() {
            Some(attempt) => attempt.card_info = Some(card_info),
            None => log::debug!("card info ignored, no active attempt"),
        }
    }

    /// Discard the settled attempt and return to `idle`.
    ///
    /// # Errors
    ///
    /// `DuplicateSubmission` while an attempt is in flight.
    pub fn reset(&mut self) -> Result<(), PaymentError> {
        if let Some(active) = self.in_flight_attempt() {
            return Err(PaymentError::DuplicateSubmission { attempt_id: active });
        }
        self.attempt = None;
        self.validation = None;
        self.field_error = None;
        self.transition(SubmissionState::Idle);
        Ok(())
    }

    /// Pick the attempt back up on the challenge page.
    ///
    /// Reads the navigation context and either asks the page to show the
    /// issuer challenge or replays the challenge outcome and settles.
    /// A missing attempt id settles as `LostAttemptContext`.
    ///
    /// # Errors
    ///
    /// `DuplicateSubmission` when this controller already holds a different
    /// in-flight attempt.
    pub fn resume_from_navigation(&mut self) -> Result<ChallengeStep, PaymentError> {
        let context = self.redirect.read_context();

        let Some(id) = context.attempt_id() else {
            if let Some(active) = self.in_flight_attempt() {
                return Err(PaymentError::DuplicateSubmission { attempt_id: active });
            }
            log::error!("challenge page loaded without an attempt identifier");
            self.attempt = None;
            self.settle_failed(PaymentError::LostAttemptContext);
            return Ok(ChallengeStep::Settled(self.outcome()));
        };

        self.restore_pending(id.clone(), context.redirect())?;

        if let Some(event) = context.outcome() {
            self.handle_event(event);
            return Ok(ChallengeStep::Settled(self.outcome()));
        }
        match context.redirect() {
            Some(redirect) => Ok(ChallengeStep::Challenge {
                attempt_id: id,
                redirect: redirect.to_string(),
            }),
            None => {
                self.settle_failed(PaymentError::MalformedSuccessResponse);
                Ok(ChallengeStep::Settled(self.outcome()))
            }
        }
    }

    fn restore_pending(&mut self, id: AttemptId, redirect: Option<&str>) -> Result<(), PaymentError> {
        if let Some(active) = self.in_flight_attempt() {
            if active == id && self.state == SubmissionState::ThreeDsPending {
                return Ok(());
            }
            return Err(PaymentError::DuplicateSubmission { attempt_id: active });
        }
        let mut attempt = PaymentAttempt::new(id, PaymentStatus::Pending);
        attempt.redirect = redirect.map(str::to_string);
        self.attempt = Some(attempt);
        self.validation = None;
        self.transition(SubmissionState::ThreeDsPending);
        Ok(())
    }

    fn complete_submission(&mut self, success: SecureFieldsSuccess) {
        if let (Some(info), Some(attempt)) = (success.card_info.clone(), self.attempt.as_mut()) {
            attempt.card_info = Some(info);
        }

        if let Some(redirect) = success.redirect_target() {
            let Some(attempt) = self.attempt.as_mut() else {
                return;
            };
            attempt.status = PaymentStatus::Pending;
            attempt.redirect = Some(redirect.to_string());
            let id = attempt.id.clone();

            self.transition(SubmissionState::ThreeDsPending);
            self.analytics
                .track(analytics::THREE_DS_STARTED, json!({ "attemptId": id }));
            if let Err(e) = self.redirect.hand_off(&id, redirect) {
                self.settle_failed(e);
            }
        } else if let Some(transaction_id) = success.transaction() {
            self.settle_success(transaction_id.to_string());
        } else {
            self.settle_failed(PaymentError::MalformedSuccessResponse);
        }
    }

    fn complete_challenge(&mut self, success: SecureFieldsSuccess) {
        match success.transaction() {
            Some(transaction_id) => self.settle_success(transaction_id.to_string()),
            None => self.settle_failed(PaymentError::MalformedSuccessResponse),
        }
    }

    fn settle_success(&mut self, transaction_id: String) {
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };
        attempt.status = PaymentStatus::Success;
        attempt.transaction_id = Some(transaction_id.clone());
        attempt.error = None;
        let id = attempt.id.clone();

        self.transition(SubmissionState::Settled(Settlement::Success));
        log::info!("attempt {} settled with transaction {}", id, transaction_id);
        self.analytics.track(
            analytics::PAYMENT_SUCCEEDED,
            json!({ "attemptId": id, "transactionId": transaction_id }),
        );
    }

    fn settle_failed(&mut self, err: PaymentError) {
        let attempt = self
            .attempt
            .get_or_insert_with(|| PaymentAttempt::new(AttemptId::generate(), PaymentStatus::Failed));
        attempt.status = PaymentStatus::Failed;
        let id = attempt.id.clone();
        let properties = json!({
            "attemptId": id,
            "errorKind": err.kind(),
            "errorCode": err.code(),
        });
        log::error!("attempt {} failed: {}", id, err);
        attempt.error = Some(err);

        self.transition(SubmissionState::Settled(Settlement::Failed));
        self.analytics.track(analytics::PAYMENT_FAILED, properties);
    }

    fn in_flight_attempt(&self) -> Option<AttemptId> {
        if !self.state.is_in_flight() {
            return None;
        }
        self.attempt.as_ref().map(|a| a.id.clone())
    }

    fn transition(&mut self, next: SubmissionState) {
        if self.state != next {
            log::info!("payment state {} -> {}", self.state, next);
        }
        self.state = next;
    }
}
