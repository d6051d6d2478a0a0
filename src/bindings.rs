//! yew_secure_fields/src/bindings.rs
//!
//! Low-level wasm-bindgen bindings to the Secure Fields tokenization script
//! and the RudderStack analytics snippet.
//!
//! Exposes the raw `window.SecureFields` handle and `rudderanalytics.track`.
//! Typed wrappers live in `browser.rs`.

use wasm_bindgen::prelude::*;
use web_sys::js_sys::Function;

#[wasm_bindgen]
extern "C" {
    //------------------------------------------------------------------------------
    // Secure Fields
    //------------------------------------------------------------------------------

    /// Raw Secure Fields instance.
    #[wasm_bindgen(js_name = SecureFields)]
    #[derive(Debug, Clone)]
    pub type JsSecureFields;

    /// `new SecureFields()`. Throws if the script has not loaded.
    #[wasm_bindgen(catch, constructor, js_class = "SecureFields")]
    pub fn new() -> Result<JsSecureFields, JsValue>;

    /// `secureFields.initTokenize(merchantId, fields)`
    #[wasm_bindgen(method, catch, js_name = initTokenize)]
    pub fn init_tokenize(this: &JsSecureFields, merchant_id: f64, fields: JsValue) -> Result<(), JsValue>;

    /// `secureFields.on(event, handler)`
    #[wasm_bindgen(method, js_name = on)]
    pub fn on(this: &JsSecureFields, event: &str, handler: &Function);

    /// `secureFields.submit(options)` → result arrives via `success` / `error`
    #[wasm_bindgen(method, catch, js_name = submit)]
    pub fn submit(this: &JsSecureFields, options: JsValue) -> Result<(), JsValue>;

    /// `secureFields.getCardInfo(callback)`
    #[wasm_bindgen(method, js_name = getCardInfo)]
    pub fn get_card_info(this: &JsSecureFields, callback: &Function);

    /// `secureFields.setPlaceholder(field, placeholder)`
    #[wasm_bindgen(method, js_name = setPlaceholder)]
    pub fn set_placeholder(this: &JsSecureFields, field: &str, placeholder: &str);

    //------------------------------------------------------------------------------
    // Analytics
    //------------------------------------------------------------------------------

    /// `rudderanalytics.track(event, properties)`
    #[wasm_bindgen(catch, js_namespace = rudderanalytics, js_name = track)]
    pub fn rudder_track(event: &str, properties: JsValue) -> Result<(), JsValue>;
}
