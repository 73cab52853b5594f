//! Card tokenization seam.
//!
//! The checkout never talks to Stripe.js directly. It asks a [`CardGateway`]
//! to validate card fields and to turn raw card data into a reusable source,
//! so tests can swap in a scripted gateway and the browser build plugs in
//! [`StripeClient`](crate::client::StripeClient).

use serde::{Deserialize, Serialize};

/// Raw card data as typed into the card form.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct CardDetails {
    pub number: String,
    pub cvc: String,
    pub exp_month: String,
    pub exp_year: String,
}

/// Parameters for `Stripe.source.create`.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SourceRequest {
    #[serde(rename = "type")]
    pub source_type: String,
    pub currency: String,
    pub usage: String,
    pub card: CardDetails,
}

impl SourceRequest {
    /// A reusable card source in the given currency.
    pub fn reusable_card(card: CardDetails, currency: &str) -> Self {
        Self {
            source_type: "card".to_string(),
            currency: currency.to_string(),
            usage: "reusable".to_string(),
            card,
        }
    }
}

/// Card summary returned with a source.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct SourceCard {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub last4: Option<String>,
    /// `"required"`, `"optional"` or `"not_supported"`.
    #[serde(default)]
    pub three_d_secure: Option<String>,
}

/// A tokenized, reusable payment source.
#[derive(Clone, Debug, PartialEq)]
pub struct Source {
    pub id: String,
    pub card: SourceCard,
    /// The complete source object as the gateway returned it. Forwarded
    /// verbatim to the backend as the `pspPayload`.
    pub raw: serde_json::Value,
}

impl Source {
    /// Parse a source object as returned by the gateway.
    pub fn from_json(raw: serde_json::Value) -> Result<Self, SourceError> {
        let id = raw
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| SourceError::malformed("source has no id"))?;
        let card = match raw.get("card") {
            Some(card) => serde_json::from_value(card.clone())
                .map_err(|e| SourceError::malformed(&e.to_string()))?,
            None => SourceCard::default(),
        };
        Ok(Self { id, card, raw })
    }

    /// The card demands 3-D Secure, which this checkout does not perform.
    pub fn requires_three_d_secure(&self) -> bool {
        self.card.three_d_secure.as_deref() == Some("required")
    }

    /// Serialized source, sent along with the payment.
    pub fn psp_payload(&self) -> String {
        self.raw.to_string()
    }
}

/// A gateway-side failure, e.g. `{ type: "card_error", param: "number" }`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct SourceError {
    /// Human-readable message explaining what went wrong.
    pub message: String,
    /// Stripe's error type, e.g. `"card_error"`.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Offending parameter, e.g. `"exp_month"`.
    #[serde(default)]
    pub param: Option<String>,
}

impl SourceError {
    pub fn malformed(message: &str) -> Self {
        Self {
            message: message.to_string(),
            error_type: Some("api_error".to_string()),
            param: None,
        }
    }
}

/// Synchronous card field checks. Object safe, so the reducer can hold one.
pub trait CardValidator {
    fn validate_card_number(&self, number: &str) -> bool;

    fn validate_cvc(&self, cvc: &str) -> bool;

    fn validate_expiry(&self, month: &str, year: &str) -> bool;
}

/// Card validation and tokenization.
#[allow(async_fn_in_trait)]
pub trait CardGateway: CardValidator {
    /// Tokenize the card into a reusable source.
    async fn create_source(&self, request: SourceRequest) -> Result<Source, SourceError>;
}
