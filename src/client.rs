//! yew_pledge/src/client.rs
//!
//! High-level Rust API over Stripe.js v2 card sources.
//!
//! This module provides:
//! - `StripeClient`, the browser implementation of [`CardGateway`].
//! - Card number / CVC / expiry validation backed by `Stripe.card.*`.
//! - `create_source()`, which turns the `(status, response)` callback of
//!   `Stripe.source.create` into an awaitable `Result<Source, SourceError>`.
//!
//! # Example Usage
//! ```rust,ignore
//! use yew_pledge::client::StripeClient;
//! use yew_pledge::gateway::{CardDetails, CardGateway, SourceRequest};
//!
//! let stripe = StripeClient::new("pk_test_…");
//! wasm_bindgen_futures::spawn_local(async move {
//!     let card = CardDetails { number: "4242424242424242".into(), ..Default::default() };
//!     match stripe.create_source(SourceRequest::reusable_card(card, "CHF")).await {
//!         Ok(source) => tracing::info!(id = %source.id, "source created"),
//!         Err(err) => tracing::error!(message = %err.message, "source failed"),
//!     }
//! });
//! ```

use gloo_utils::format::JsValueSerdeExt;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::{prelude::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::js_sys::{Array, Function, Promise, Reflect};

use crate::bindings;
use crate::gateway::{CardGateway, CardValidator, Source, SourceError, SourceRequest};

/// HTTP-like status Stripe.js v2 reports for a created source.
const STATUS_OK: u16 = 200;

/// [`CardGateway`] backed by the global Stripe.js v2 object.
#[derive(Clone, Debug, PartialEq)]
pub struct StripeClient {
    publishable_key: String,
}

impl StripeClient {
    /// # Arguments
    ///
    /// * `publishable_key` – Your Stripe publishable key (starts with `pk_`).
    ///   Applied right before every source creation, so the client may be
    ///   built before Stripe.js has finished loading.
    pub fn new(publishable_key: impl Into<String>) -> Self {
        Self {
            publishable_key: publishable_key.into(),
        }
    }
}

impl CardValidator for StripeClient {
    fn validate_card_number(&self, number: &str) -> bool {
        checked(bindings::validate_card_number(number), "validateCardNumber")
    }

    fn validate_cvc(&self, cvc: &str) -> bool {
        checked(bindings::validate_cvc(cvc), "validateCVC")
    }

    fn validate_expiry(&self, month: &str, year: &str) -> bool {
        checked(bindings::validate_expiry(month, year), "validateExpiry")
    }
}

impl CardGateway for StripeClient {
    async fn create_source(&self, request: SourceRequest) -> Result<Source, SourceError> {
        bindings::set_publishable_key(&self.publishable_key).map_err(js_to_source_error)?;
        let params = to_value(&request).map_err(serde_error_to_source_error)?;

        // Resolve with `[status, response]` once Stripe.js calls back.
        let promise = Promise::new(&mut |resolve: Function, reject: Function| {
            let callback = Closure::once_into_js(move |status: f64, response: JsValue| {
                let outcome = Array::of2(&JsValue::from(status), &response);
                let _ = resolve.call1(&JsValue::NULL, &outcome);
            });
            if let Err(e) = bindings::create_source(params.clone(), callback.unchecked_ref()) {
                let _ = reject.call1(&JsValue::NULL, &e);
            }
        });

        let outcome = Array::from(&JsFuture::from(promise).await.map_err(js_to_source_error)?);
        let status = outcome.get(0).as_f64().unwrap_or_default() as u16;
        let response = outcome.get(1);

        if status != STATUS_OK {
            tracing::warn!(status, "Stripe.js rejected the card");
            let error = Reflect::get(&response, &JsValue::from_str("error"))
                .unwrap_or(JsValue::UNDEFINED);
            return Err(js_to_source_error(error));
        }

        let raw: serde_json::Value = response
            .into_serde()
            .map_err(|e| SourceError::malformed(&e.to_string()))?;
        Source::from_json(raw)
    }
}

/// A validator that threw (Stripe.js missing) counts as "invalid".
fn checked(result: Result<bool, JsValue>, name: &str) -> bool {
    result.unwrap_or_else(|e| {
        tracing::warn!(validator = name, error = ?e, "Stripe.js validator unavailable");
        false
    })
}

/// Convert any caught `JsValue` into a `SourceError` with best effort.
fn js_to_source_error(value: JsValue) -> SourceError {
    from_value::<SourceError>(value.clone()).unwrap_or_else(|_| SourceError {
        message: value.as_string().unwrap_or_else(|| format!("{:?}", value)),
        error_type: None,
        param: None,
    })
}

/// Convert a `serde_wasm_bindgen::Error` (from `to_value`) into `SourceError`.
fn serde_error_to_source_error(err: serde_wasm_bindgen::Error) -> SourceError {
    SourceError {
        message: err.to_string(),
        error_type: None,
        param: None,
    }
}
