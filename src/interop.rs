//! interop.rs
//!
//! Custom Yew hook to load the Secure Fields script at runtime (no inline JS).
//!
//! # Overview
//! `use_secure_fields_script(src)` injects a single
//! `<script id="secure-fields-sdk" src=... defer>` into `<head>` on first use,
//! returns `false` until the script's `load` event fires, then `true` on
//! every subsequent call.
//!
//! # Usage
//! ```rust,ignore
//! use yew::prelude::*;
//! use yew_secure_fields::use_secure_fields_script;
//!
//! #[function_component(App)]
//! fn app() -> Html {
//!     let ready = use_secure_fields_script(yew_secure_fields::config::DEFAULT_SCRIPT_SRC);
//!     html! {
//!         if ready { <p>{"Secure Fields loaded"}</p> } else { <p>{"Loading..."}</p> }
//!     }
//! }
//! ```

use wasm_bindgen::{prelude::Closure, JsCast, JsValue};
use web_sys::js_sys::Reflect;
use web_sys::{Document, HtmlScriptElement};
use yew::functional::hook;
use yew::prelude::*;

const SCRIPT_ID: &str = "secure-fields-sdk";

/// True once `window.SecureFields` exists.
fn secure_fields_present() -> bool {
    web_sys::window()
        .and_then(|win| Reflect::has(&win, &JsValue::from_str("SecureFields")).ok())
        .unwrap_or(false)
}

fn inject_script(document: &Document, src: &str, onload: &Closure<dyn Fn()>) -> Result<(), JsValue> {
    let script: HtmlScriptElement = document.create_element("script")?.dyn_into()?;
    script.set_id(SCRIPT_ID);
    script.set_src(src);
    script.set_defer(true);
    script.set_onload(Some(onload.as_ref().unchecked_ref()));

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("document has no <head>"))?;
    head.append_child(&script)?;
    Ok(())
}

/// Load the Secure Fields script exactly once and track readiness.
///
/// All components calling this hook share the same `<script>` element.
#[hook]
pub fn use_secure_fields_script(src: &str) -> bool {
    let loaded = use_state(secure_fields_present);

    {
        let loaded = loaded.clone();
        let src = src.to_string();
        use_effect_with(src, move |src| {
            if !*loaded {
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    match document.get_element_by_id(SCRIPT_ID) {
                        None => {
                            let onload = Closure::wrap(Box::new(move || {
                                loaded.set(true);
                            }) as Box<dyn Fn()>);

                            match inject_script(&document, src, &onload) {
                                // leaked so it lives until the load event
                                Ok(()) => onload.forget(),
                                Err(e) => log::error!("could not load Secure Fields script: {:?}", e),
                            }
                        }
                        Some(_) if secure_fields_present() => loaded.set(true),
                        // injected by another component, still loading
                        Some(existing) => {
                            let onload = Closure::wrap(Box::new(move || {
                                loaded.set(true);
                            }) as Box<dyn Fn()>);
                            match existing.add_event_listener_with_callback(
                                "load",
                                onload.as_ref().unchecked_ref(),
                            ) {
                                Ok(()) => onload.forget(),
                                Err(e) => log::error!("could not watch Secure Fields script: {:?}", e),
                            }
                        }
                    }
                }
            }
            || ()
        });
    }

    *loaded
}
