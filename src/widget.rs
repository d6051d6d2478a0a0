//! Widget adapter.
//!
//! The tokenization widget is an injected capability ([`TokenizationWidget`])
//! rather than a global object. [`WidgetAdapter`] sits on top of it, decodes
//! the untyped event payloads into [`WidgetEvent`] variants, and forwards each
//! one to the single handler registered for it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value as JsonValue;

use crate::config::FieldConfig;
use crate::error::{PaymentError, WidgetError};
use crate::types::{CardField, CardInfo, SecureFieldsSuccess, SecureFieldsValidationResponse, SubmitOptions};

/// Listener for one raw widget event.
pub type RawListener = Box<dyn Fn(JsonValue)>;

/// One-shot callback for `getCardInfo`.
pub type CardInfoCallback = Box<dyn FnOnce(JsonValue)>;

/// Events the widget emits that the payment flow cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WidgetEventKind {
    Validation,
    Error,
    Success,
}

impl WidgetEventKind {
    pub const ALL: [WidgetEventKind; 3] = [
        WidgetEventKind::Validation,
        WidgetEventKind::Error,
        WidgetEventKind::Success,
    ];

    /// Event name passed to the widget's `on(...)`.
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetEventKind::Validation => "validate",
            WidgetEventKind::Error => "error",
            WidgetEventKind::Success => "success",
        }
    }
}

/// The operations the tokenization widget offers. Opaque beyond this surface.
///
/// Listeners may fire at any time, including synchronously from inside
/// `submit`; route them through a
/// [`ControllerHandle`](crate::handle::ControllerHandle), which queues
/// events until the controller is free.
pub trait TokenizationWidget {
    fn init_tokenize(&self, merchant_id: u64, fields: &FieldConfig) -> Result<(), PaymentError>;

    /// Attach a listener for one event kind.
    fn on(&self, kind: WidgetEventKind, listener: RawListener);

    fn submit(&self, options: &SubmitOptions) -> Result<(), PaymentError>;

    fn get_card_info(&self, callback: CardInfoCallback);

    fn set_placeholder(&self, field: CardField, text: &str);
}

/// Typed widget event.
#[derive(Clone, Debug, PartialEq)]
pub enum WidgetEvent {
    Validation(SecureFieldsValidationResponse),
    Error(WidgetError),
    Success(SecureFieldsSuccess),
}

impl WidgetEvent {
    /// Decode a raw payload for the given event kind.
    ///
    /// Unreadable validation payloads become an error event. Unreadable
    /// success payloads become an empty success, which the controller treats
    /// as malformed.
    pub fn decode(kind: WidgetEventKind, payload: JsonValue) -> Self {
        match kind {
            WidgetEventKind::Validation => match serde_json::from_value(payload) {
                Ok(response) => WidgetEvent::Validation(response),
                Err(e) => {
                    log::warn!("unreadable validation payload: {}", e);
                    WidgetEvent::Error(
                        WidgetError::new("Card details could not be validated.")
                            .with_code("malformed_validation"),
                    )
                }
            },
            WidgetEventKind::Error => WidgetEvent::Error(WidgetError::from_payload(&payload)),
            WidgetEventKind::Success => {
                WidgetEvent::Success(serde_json::from_value(payload).unwrap_or_else(|e| {
                    log::warn!("unreadable success payload: {}", e);
                    SecureFieldsSuccess::default()
                }))
            }
        }
    }

    pub fn kind(&self) -> WidgetEventKind {
        match self {
            WidgetEvent::Validation(_) => WidgetEventKind::Validation,
            WidgetEvent::Error(_) => WidgetEventKind::Error,
            WidgetEvent::Success(_) => WidgetEventKind::Success,
        }
    }
}

/// A single replaceable handler.
struct HandlerSlot<T>(RefCell<Option<Box<dyn FnMut(T)>>>);

impl<T> HandlerSlot<T> {
    fn new() -> Self {
        Self(RefCell::new(None))
    }

    fn set(&self, handler: Box<dyn FnMut(T)>) {
        *self.0.borrow_mut() = Some(handler);
    }

    fn clear(&self) {
        self.0.borrow_mut().take();
    }

    fn is_set(&self) -> bool {
        self.0.borrow().is_some()
    }

    /// Call the handler. Taken out for the call so it may re-register.
    fn emit(&self, value: T) -> bool {
        let handler = self.0.borrow_mut().take();
        match handler {
            Some(mut handler) => {
                handler(value);
                let mut slot = self.0.borrow_mut();
                if slot.is_none() {
                    *slot = Some(handler);
                }
                true
            }
            None => false,
        }
    }
}

struct Handlers {
    validation: HandlerSlot<SecureFieldsValidationResponse>,
    error: HandlerSlot<WidgetError>,
    success: HandlerSlot<SecureFieldsSuccess>,
}

impl Handlers {
    fn new() -> Self {
        Self {
            validation: HandlerSlot::new(),
            error: HandlerSlot::new(),
            success: HandlerSlot::new(),
        }
    }

    fn dispatch(&self, event: WidgetEvent) {
        let kind = event.kind();
        let delivered = match event {
            WidgetEvent::Validation(v) => self.validation.emit(v),
            WidgetEvent::Error(e) => self.error.emit(e),
            WidgetEvent::Success(s) => self.success.emit(s),
        };
        if !delivered {
            log::debug!("{} event dropped, no handler registered", kind.as_str());
        }
    }

    fn clear(&self) {
        self.validation.clear();
        self.error.clear();
        self.success.clear();
    }
}

/// Typed facade over a [`TokenizationWidget`].
pub struct WidgetAdapter {
    widget: Rc<dyn TokenizationWidget>,
    handlers: Rc<Handlers>,
    initialized: Cell<bool>,
    listening: Cell<bool>,
}

impl WidgetAdapter {
    pub fn new(widget: Rc<dyn TokenizationWidget>) -> Self {
        Self {
            widget,
            handlers: Rc::new(Handlers::new()),
            initialized: Cell::new(false),
            listening: Cell::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Configure the widget for this page.
    ///
    /// # Errors
    ///
    /// `PaymentError::AdapterInit` when called twice without [`teardown`],
    /// or when the widget itself refuses the configuration.
    ///
    /// [`teardown`]: WidgetAdapter::teardown
    pub fn initialize(&self, merchant_id: u64, fields: &FieldConfig) -> Result<(), PaymentError> {
        if self.initialized.get() {
            log::error!("tokenization widget initialized twice");
            return Err(PaymentError::AdapterInit {
                reason: "initialize called twice without teardown".into(),
            });
        }

        if !self.listening.get() {
            for kind in WidgetEventKind::ALL {
                let handlers = Rc::downgrade(&self.handlers);
                self.widget.on(
                    kind,
                    Box::new(move |payload| {
                        if let Some(handlers) = handlers.upgrade() {
                            handlers.dispatch(WidgetEvent::decode(kind, payload));
                        }
                    }),
                );
            }
            self.listening.set(true);
        }

        self.widget
            .init_tokenize(merchant_id, fields)
            .map_err(|e| PaymentError::AdapterInit {
                reason: e.to_string(),
            })?;
        self.initialized.set(true);
        log::info!("tokenization widget initialized for merchant {}", merchant_id);
        Ok(())
    }

    /// Drop all handlers and allow [`initialize`](WidgetAdapter::initialize) again.
    pub fn teardown(&self) {
        self.handlers.clear();
        self.initialized.set(false);
    }

    pub fn on_validation(&self, handler: impl FnMut(SecureFieldsValidationResponse) + 'static) {
        self.handlers.validation.set(Box::new(handler));
    }

    pub fn on_error(&self, handler: impl FnMut(WidgetError) + 'static) {
        self.handlers.error.set(Box::new(handler));
    }

    pub fn on_success(&self, handler: impl FnMut(SecureFieldsSuccess) + 'static) {
        self.handlers.success.set(Box::new(handler));
    }

    /// Route every event kind to one handler taking the typed event.
    pub fn on_event(&self, handler: impl FnMut(WidgetEvent) + 'static) {
        let handler = Rc::new(RefCell::new(handler));

        let h = handler.clone();
        self.on_validation(move |v| (*h.borrow_mut())(WidgetEvent::Validation(v)));
        let h = handler.clone();
        self.on_error(move |e| (*h.borrow_mut())(WidgetEvent::Error(e)));
        self.on_success(move |s| (*handler.borrow_mut())(WidgetEvent::Success(s)));
    }

    pub fn has_handler(&self, kind: WidgetEventKind) -> bool {
        match kind {
            WidgetEventKind::Validation => self.handlers.validation.is_set(),
            WidgetEventKind::Error => self.handlers.error.is_set(),
            WidgetEventKind::Success => self.handlers.success.is_set(),
        }
    }

    /// Hand the card data to the widget for tokenization.
    ///
    /// The outcome arrives later through the success or error handler.
    pub fn submit(&self, options: &SubmitOptions) -> Result<(), PaymentError> {
        if !self.initialized.get() {
            return Err(PaymentError::AdapterInit {
                reason: "submit called before initialize".into(),
            });
        }
        self.widget.submit(options)
    }

    /// Ask the widget for card metadata.
    ///
    /// The callback may run before or after the success event.
    pub fn request_card_info(&self, callback: impl FnOnce(Option<CardInfo>) + 'static) {
        self.widget.get_card_info(Box::new(move |payload| {
            callback(CardInfo::from_payload(&payload));
        }));
    }

    pub fn set_placeholder(&self, field: CardField, text: &str) {
        self.widget.set_placeholder(field, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct StubWidget {
        listeners: RefCell<Vec<(WidgetEventKind, RawListener)>>,
        inits: Cell<u32>,
    }

    impl StubWidget {
        fn emit(&self, kind: WidgetEventKind, payload: JsonValue) {
            for (k, listener) in self.listeners.borrow().iter() {
                if *k == kind {
                    listener(payload.clone());
                }
            }
        }
    }

    impl TokenizationWidget for StubWidget {
        fn init_tokenize(&self, _merchant_id: u64, _fields: &FieldConfig) -> Result<(), PaymentError> {
            self.inits.set(self.inits.get() + 1);
            Ok(())
        }
        fn on(&self, kind: WidgetEventKind, listener: RawListener) {
            self.listeners.borrow_mut().push((kind, listener));
        }
        fn submit(&self, _options: &SubmitOptions) -> Result<(), PaymentError> {
            Ok(())
        }
        fn get_card_info(&self, callback: CardInfoCallback) {
            callback(json!({ "cardInfo": { "brand": "VISA" } }));
        }
        fn set_placeholder(&self, _field: CardField, _text: &str) {}
    }

    fn adapter() -> (Rc<StubWidget>, WidgetAdapter) {
        let widget = Rc::new(StubWidget::default());
        let adapter = WidgetAdapter::new(widget.clone());
        (widget, adapter)
    }

    #[test]
    fn second_initialize_fails_until_teardown() {
        let (widget, adapter) = adapter();
        adapter.initialize(1, &FieldConfig::default()).unwrap();
        let err = adapter.initialize(1, &FieldConfig::default()).unwrap_err();
        assert!(matches!(err, PaymentError::AdapterInit { .. }));

        adapter.teardown();
        adapter.initialize(1, &FieldConfig::default()).unwrap();
        assert_eq!(widget.inits.get(), 2);
        // listeners are attached once per widget
        assert_eq!(widget.listeners.borrow().len(), 3);
    }

    #[test]
    fn reregistration_replaces_handler() {
        let (widget, adapter) = adapter();
        adapter.initialize(1, &FieldConfig::default()).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let first = seen.clone();
        adapter.on_success(move |_| first.borrow_mut().push("first"));
        let second = seen.clone();
        adapter.on_success(move |_| second.borrow_mut().push("second"));

        widget.emit(WidgetEventKind::Success, json!({ "transactionId": "tx1" }));
        assert_eq!(*seen.borrow(), vec!["second"]);
    }

    #[test]
    fn error_payloads_are_normalized_before_handlers() {
        let (widget, adapter) = adapter();
        adapter.initialize(1, &FieldConfig::default()).unwrap();

        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        adapter.on_error(move |e| *sink.borrow_mut() = Some(e));

        widget.emit(WidgetEventKind::Error, json!({ "data": { "code": "invalid_card" } }));
        assert_eq!(
            seen.borrow().as_ref().and_then(|e| e.code.clone()).as_deref(),
            Some("invalid_card")
        );
    }

    #[test]
    fn malformed_validation_becomes_error_event() {
        let event = WidgetEvent::decode(WidgetEventKind::Validation, json!({ "nope": true }));
        assert_eq!(event.kind(), WidgetEventKind::Error);

        let event = WidgetEvent::decode(WidgetEventKind::Success, json!("garbage"));
        assert_eq!(event, WidgetEvent::Success(SecureFieldsSuccess::default()));
    }

    #[test]
    fn submit_requires_initialize() {
        let (_widget, adapter) = adapter();
        let options = SubmitOptions::new(1, 30, "SIMPLE").unwrap();
        assert!(adapter.submit(&options).is_err());
    }

    #[test]
    fn teardown_drops_handlers() {
        let (_widget, adapter) = adapter();
        adapter.on_event(|_| {});
        assert!(adapter.has_handler(WidgetEventKind::Error));
        adapter.teardown();
        assert!(!adapter.has_handler(WidgetEventKind::Error));
    }

    #[test]
    fn card_info_is_decoded() {
        let (_widget, adapter) = adapter();
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        adapter.request_card_info(move |info| *sink.borrow_mut() = info);
        assert_eq!(seen.borrow().as_ref().map(|i| i.brand.as_str()), Some("VISA"));
    }
}
