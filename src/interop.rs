//! interop.rs
//!
//! Custom Yew hook to load Stripe.js v2 at runtime (no inline JS).
//!
//! # Overview
//! This hook, `use_stripejs()`, injects a single
//! `<script id="stripejs-v2" src="https://js.stripe.com/v2/" defer>`
//! into `<head>` on first use, returns `false` until the
//! script's `load` event fires, then returns `true`
//! on every subsequent call.
//!
//! # Usage
//! ```rust,ignore
//! use yew::prelude::*;
//! use yew_pledge::use_stripejs;
//!
//! #[function_component(App)]
//! fn app() -> Html {
//!     let stripe_ready = use_stripejs();
//!     html! {
//!         if stripe_ready {
//!             <p>{"Stripe.js loaded"}</p>
//!         } else {
//!             <p>{"Loading Stripe.js..."}</p>
//!         }
//!     }
//! }
//! ```

use wasm_bindgen::{prelude::Closure, JsCast, JsValue};
use web_sys::js_sys::Reflect;
use web_sys::{Document, HtmlScriptElement};
use yew::functional::hook;
use yew::prelude::*;

const SCRIPT_ID: &str = "stripejs-v2";
const SCRIPT_SRC: &str = "https://js.stripe.com/v2/";

/// Custom hook: load Stripe.js v2 exactly once and track readiness.
///
/// # Returns
/// - `false` while the `<script>` is being fetched & parsed.
/// - `true` once `window.Stripe` exists.
#[hook]
pub fn use_stripejs() -> bool {
    let loaded = use_state(stripe_present);

    {
        let loaded = loaded.clone();
        use_effect_with((), move |_| {
            if !*loaded {
                if let Err(e) = inject_script(move || loaded.set(true)) {
                    tracing::error!(error = ?e, "failed to inject Stripe.js");
                }
            }
            || ()
        });
    }

    *loaded
}

fn stripe_present() -> bool {
    web_sys::window()
        .and_then(|win| Reflect::has(&win, &JsValue::from_str("Stripe")).ok())
        .unwrap_or(false)
}

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|win| win.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

/// Append the script tag, or wait on the one another mount already added.
fn inject_script(on_load: impl Fn() + 'static) -> Result<(), JsValue> {
    let document = document()?;
    let onload_closure = Closure::wrap(Box::new(on_load) as Box<dyn Fn()>);

    if let Some(existing) = document.get_element_by_id(SCRIPT_ID) {
        existing.add_event_listener_with_callback("load", onload_closure.as_ref().unchecked_ref())?;
        onload_closure.forget();
        return Ok(());
    }

    let script: HtmlScriptElement = document.create_element("script")?.dyn_into()?;
    script.set_id(SCRIPT_ID);
    script.set_src(SCRIPT_SRC);
    script.set_defer(true);

    script.set_onload(Some(onload_closure.as_ref().unchecked_ref()));
    // Leak so it lives until the load event
    onload_closure.forget();

    document
        .head()
        .ok_or_else(|| JsValue::from_str("head missing"))?
        .append_child(&script)?;
    tracing::debug!(src = SCRIPT_SRC, "Stripe.js script injected");
    Ok(())
}
