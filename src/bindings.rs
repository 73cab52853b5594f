//! yew_pledge/src/bindings.rs
//!
//! Low‐level wasm-bindgen bindings to Stripe.js v2.
//!
//! Stripe.js v2 lives on the global `Stripe` object: card validators under
//! `Stripe.card`, source creation under `Stripe.source`. Every binding is
//! `catch` so a missing script surfaces as `Err` instead of a panic.
//! Higher-level wrappers live in `client.rs`.

use wasm_bindgen::prelude::*;
use web_sys::js_sys::Function;

#[wasm_bindgen]
extern "C" {
    //------------------------------------------------------------------------------
    // Setup
    //------------------------------------------------------------------------------

    /// `Stripe.setPublishableKey(key)`
    #[wasm_bindgen(catch, js_namespace = Stripe, js_name = setPublishableKey)]
    pub fn set_publishable_key(publishable_key: &str) -> Result<(), JsValue>;

    //------------------------------------------------------------------------------
    // Card validators
    //------------------------------------------------------------------------------

    /// `Stripe.card.validateCardNumber(number)` → `bool`
    #[wasm_bindgen(catch, js_namespace = ["Stripe", "card"], js_name = validateCardNumber)]
    pub fn validate_card_number(number: &str) -> Result<bool, JsValue>;

    /// `Stripe.card.validateCVC(cvc)` → `bool`
    #[wasm_bindgen(catch, js_namespace = ["Stripe", "card"], js_name = validateCVC)]
    pub fn validate_cvc(cvc: &str) -> Result<bool, JsValue>;

    /// `Stripe.card.validateExpiry(month, year)` → `bool`
    #[wasm_bindgen(catch, js_namespace = ["Stripe", "card"], js_name = validateExpiry)]
    pub fn validate_expiry(month: &str, year: &str) -> Result<bool, JsValue>;

    //------------------------------------------------------------------------------
    // Sources
    //------------------------------------------------------------------------------

    /// `Stripe.source.create(params, function (status, response) { … })`
    #[wasm_bindgen(catch, js_namespace = ["Stripe", "source"], js_name = create)]
    pub fn create_source(params: JsValue, callback: &Function) -> Result<(), JsValue>;
}
