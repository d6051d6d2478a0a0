//! Shared fakes and fixtures for the integration tests.
//!
//! Every browser capability is replaced by an in-memory recorder so the whole
//! payment flow runs under a native `cargo test`.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use rstest::fixture;
use serde_json::{json, Value as JsonValue};

use yew_secure_fields::analytics::Analytics;
use yew_secure_fields::widget::{CardInfoCallback, RawListener};
use yew_secure_fields::{
    CardField, ControllerHandle, FieldConfig, Navigator, PaymentError, SubmissionController,
    SubmitOptions, ThreeDsRedirectHandler, TokenizationWidget, WidgetAdapter, WidgetEventKind,
};

/// Tokenization widget that records every call and fires events on demand.
#[derive(Default)]
pub struct RecordingWidget {
    listeners: RefCell<HashMap<WidgetEventKind, Vec<RawListener>>>,
    card_info_requests: RefCell<Vec<CardInfoCallback>>,
    pub init_calls: Cell<usize>,
    pub submissions: RefCell<Vec<SubmitOptions>>,
    pub placeholders: RefCell<Vec<(CardField, String)>>,
    pub fail_init: RefCell<Option<PaymentError>>,
    pub fail_submit: RefCell<Option<PaymentError>>,
    /// Fired from inside the next `submit` call, before it returns.
    pub emit_during_submit: RefCell<Option<(WidgetEventKind, JsonValue)>>,
}

impl RecordingWidget {
    /// Deliver a raw payload to every listener of `kind`.
    pub fn emit(&self, kind: WidgetEventKind, payload: JsonValue) {
        let listeners = self.listeners.borrow();
        for listener in listeners.get(&kind).into_iter().flatten() {
            listener(payload.clone());
        }
    }

    pub fn listener_count(&self, kind: WidgetEventKind) -> usize {
        self.listeners.borrow().get(&kind).map_or(0, Vec::len)
    }

    pub fn pending_card_info_requests(&self) -> usize {
        self.card_info_requests.borrow().len()
    }

    /// Answer the oldest `getCardInfo` request.
    pub fn answer_card_info(&self, payload: JsonValue) {
        let callback = {
            let mut requests = self.card_info_requests.borrow_mut();
            if requests.is_empty() {
                return;
            }
            requests.remove(0)
        };
        callback(payload);
    }
}

impl TokenizationWidget for RecordingWidget {
    fn init_tokenize(&self, _merchant_id: u64, _fields: &FieldConfig) -> Result<(), PaymentError> {
        self.init_calls.set(self.init_calls.get() + 1);
        match self.fail_init.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn on(&self, kind: WidgetEventKind, listener: RawListener) {
        self.listeners.borrow_mut().entry(kind).or_default().push(listener);
    }

    fn submit(&self, options: &SubmitOptions) -> Result<(), PaymentError> {
        self.submissions.borrow_mut().push(options.clone());
        let immediate = self.emit_during_submit.borrow_mut().take();
        if let Some((kind, payload)) = immediate {
            self.emit(kind, payload);
        }
        match self.fail_submit.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn get_card_info(&self, callback: CardInfoCallback) {
        self.card_info_requests.borrow_mut().push(callback);
    }

    fn set_placeholder(&self, field: CardField, text: &str) {
        self.placeholders.borrow_mut().push((field, text.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingAnalytics {
    pub events: RefCell<Vec<(String, JsonValue)>>,
}

impl RecordingAnalytics {
    pub fn names(&self) -> Vec<String> {
        self.events.borrow().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn last(&self, name: &str) -> Option<JsonValue> {
        self.events
            .borrow()
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, props)| props.clone())
    }
}

impl Analytics for RecordingAnalytics {
    fn track(&self, event: &str, properties: JsonValue) {
        self.events.borrow_mut().push((event.to_string(), properties));
    }
}

/// Navigator with a settable query string and a history of destinations.
#[derive(Default)]
pub struct MemoryNavigator {
    pub query: RefCell<String>,
    pub visited: RefCell<Vec<String>>,
    pub fail: Cell<bool>,
}

impl MemoryNavigator {
    pub fn at(query: &str) -> Self {
        Self {
            query: RefCell::new(query.to_string()),
            ..Self::default()
        }
    }

    /// Simulate arriving on the page we last navigated to.
    pub fn follow_last(&self) {
        if let Some(destination) = self.visited.borrow().last() {
            let query = destination.split_once('?').map_or("", |(_, q)| q);
            *self.query.borrow_mut() = query.to_string();
        }
    }
}

impl Navigator for MemoryNavigator {
    fn navigate(&self, destination: &str) -> Result<(), PaymentError> {
        if self.fail.get() {
            return Err(PaymentError::Navigation("navigation blocked".into()));
        }
        self.visited.borrow_mut().push(destination.to_string());
        Ok(())
    }

    fn query(&self) -> String {
        self.query.borrow().clone()
    }
}

/// A payment page wired the way the checkout component wires it.
pub struct Checkout {
    pub widget: Rc<RecordingWidget>,
    pub adapter: Rc<WidgetAdapter>,
    pub controller: ControllerHandle,
    pub analytics: Rc<RecordingAnalytics>,
    pub navigator: Rc<MemoryNavigator>,
}

impl Checkout {
    pub fn validate(&self, payload: JsonValue) {
        self.widget.emit(WidgetEventKind::Validation, payload);
    }

    pub fn succeed(&self, payload: JsonValue) {
        self.widget.emit(WidgetEventKind::Success, payload);
    }

    pub fn fail(&self, payload: JsonValue) {
        self.widget.emit(WidgetEventKind::Error, payload);
    }

    pub fn submit(&self) -> Result<yew_secure_fields::AttemptId, PaymentError> {
        self.controller.update(|c| c.submit(options()))
    }

    pub fn controller(&self) -> std::cell::Ref<'_, SubmissionController> {
        self.controller.borrow()
    }
}

#[fixture]
pub fn checkout() -> Checkout {
    let widget = Rc::new(RecordingWidget::default());
    let adapter = Rc::new(WidgetAdapter::new(widget.clone()));
    adapter
        .initialize(1100007006, &FieldConfig::default())
        .expect("initialize");

    let analytics = Rc::new(RecordingAnalytics::default());
    let navigator = Rc::new(MemoryNavigator::default());
    let redirect = ThreeDsRedirectHandler::new("/3ds", navigator.clone());
    let controller = ControllerHandle::new(
        SubmissionController::new(analytics.clone(), redirect).with_widget(adapter.clone()),
    );
    controller.bind(&adapter, |_| {});

    Checkout {
        widget,
        adapter,
        controller,
        analytics,
        navigator,
    }
}

/// A checkout whose card fields already passed validation.
#[fixture]
pub fn ready_checkout(checkout: Checkout) -> Checkout {
    checkout.validate(valid_payload());
    checkout
}

/// Controller for the challenge page loaded with `query`.
pub fn challenge_page(query: &str) -> (SubmissionController, Rc<RecordingAnalytics>, Rc<MemoryNavigator>) {
    let analytics = Rc::new(RecordingAnalytics::default());
    let navigator = Rc::new(MemoryNavigator::at(query));
    let redirect = ThreeDsRedirectHandler::new("/3ds", navigator.clone());
    (
        SubmissionController::new(analytics.clone(), redirect),
        analytics,
        navigator,
    )
}

pub fn options() -> SubmitOptions {
    SubmitOptions::new(12, 2030, "SIMPLE").expect("valid expiry")
}

pub fn valid_payload() -> JsonValue {
    json!({
        "fields": {
            "cardNumber": { "valid": true, "length": 16, "paymentMethod": "VIS" },
            "cvv": { "valid": true, "required": true, "length": 3 }
        },
        "hasErrors": false,
        "event": { "trigger": "keyup" }
    })
}

pub fn invalid_card_payload() -> JsonValue {
    json!({
        "fields": {
            "cardNumber": { "valid": false, "length": 7 },
            "cvv": { "valid": true, "required": true, "length": 3 }
        },
        "hasErrors": true,
        "event": { "trigger": "blur" }
    })
}
