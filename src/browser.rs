//! Browser-backed implementations of the collaborator traits.
//!
//! - [`SecureFieldsWidget`] drives `window.SecureFields`.
//! - [`RudderAnalytics`] forwards to `rudderanalytics.track`.
//! - [`BrowserNavigator`] uses `window.location`.
//!
//! JS values cross into Rust through `gloo_utils::format::JsValueSerdeExt`
//! and go out through `serde_wasm_bindgen`'s JSON-compatible serializer, so
//! maps arrive in JS as plain objects.

use std::cell::RefCell;

use gloo_utils::format::JsValueSerdeExt;
use serde::Serialize;
use serde_json::Value as JsonValue;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::{JsCast, JsValue};

use crate::analytics::Analytics;
use crate::bindings::{rudder_track, JsSecureFields};
use crate::config::FieldConfig;
use crate::error::{PaymentError, WidgetError};
use crate::navigation::Navigator;
use crate::types::{CardField, SubmitOptions};
use crate::widget::{CardInfoCallback, RawListener, TokenizationWidget, WidgetEventKind};

/// Tokenization widget backed by the Secure Fields script.
pub struct SecureFieldsWidget {
    inner: JsSecureFields,
    // kept alive for as long as the widget may call them
    listeners: RefCell<Vec<Closure<dyn FnMut(JsValue)>>>,
}

impl SecureFieldsWidget {
    /// Construct the widget. The script must already be loaded.
    pub fn new() -> Result<Self, PaymentError> {
        let inner = JsSecureFields::new().map_err(|e| PaymentError::AdapterInit {
            reason: js_message(&e),
        })?;
        Ok(Self {
            inner,
            listeners: RefCell::new(Vec::new()),
        })
    }
}

impl TokenizationWidget for SecureFieldsWidget {
    fn init_tokenize(&self, merchant_id: u64, fields: &FieldConfig) -> Result<(), PaymentError> {
        let fields_js = to_js(fields)?;
        self.inner
            .init_tokenize(merchant_id as f64, fields_js)
            .map_err(|e| PaymentError::AdapterInit {
                reason: js_message(&e),
            })
    }

    fn on(&self, kind: WidgetEventKind, listener: RawListener) {
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            listener(js_to_json(&value));
        });
        self.inner.on(kind.as_str(), closure.as_ref().unchecked_ref());
        self.listeners.borrow_mut().push(closure);
    }

    fn submit(&self, options: &SubmitOptions) -> Result<(), PaymentError> {
        let options_js = to_js(options)?;
        self.inner
            .submit(options_js)
            .map_err(|e| PaymentError::Widget(js_to_widget_error(&e)))
    }

    fn get_card_info(&self, callback: CardInfoCallback) {
        let callback = Closure::once_into_js(move |value: JsValue| {
            callback(js_to_json(&value));
        });
        self.inner.get_card_info(callback.unchecked_ref());
    }

    fn set_placeholder(&self, field: CardField, text: &str) {
        self.inner.set_placeholder(field.as_str(), text);
    }
}

/// Analytics through the RudderStack snippet on the page.
#[derive(Clone, Copy, Debug, Default)]
pub struct RudderAnalytics;

impl Analytics for RudderAnalytics {
    fn track(&self, event: &str, properties: JsonValue) {
        let properties = match to_js(&properties) {
            Ok(p) => p,
            Err(e) => {
                log::debug!("analytics properties for {:?} dropped: {}", event, e);
                JsValue::undefined()
            }
        };
        if let Err(e) = rudder_track(event, properties) {
            log::debug!("analytics call {:?} failed: {}", event, js_message(&e));
        }
    }
}

/// Navigation through `window.location`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn navigate(&self, destination: &str) -> Result<(), PaymentError> {
        let window = web_sys::window().ok_or_else(|| PaymentError::Navigation("no window".into()))?;
        window
            .location()
            .set_href(destination)
            .map_err(|e| PaymentError::Navigation(js_message(&e)))
    }

    fn query(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().search().ok())
            .unwrap_or_default()
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, PaymentError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| PaymentError::Bridge(e.to_string()))
}

fn js_to_json(value: &JsValue) -> JsonValue {
    if value.is_undefined() || value.is_null() {
        return JsonValue::Null;
    }
    // Error objects stringify to `{}`; keep their message instead
    if value.is_instance_of::<web_sys::js_sys::Error>() {
        return JsonValue::String(js_message(value));
    }
    value
        .into_serde::<JsonValue>()
        .unwrap_or_else(|_| JsonValue::String(js_message(value)))
}

/// Convert a thrown JS value into a `WidgetError` with best effort.
fn js_to_widget_error(value: &JsValue) -> WidgetError {
    WidgetError::from_payload(&js_to_json(value))
}

fn js_message(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if let Some(err) = value.dyn_ref::<web_sys::js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{:?}", value)
}
