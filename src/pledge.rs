//! The pledge a visitor is about to pay for.

use serde::{Deserialize, Serialize};

use crate::hash::hash_of;

/// One chosen package option. Mirrors the GraphQL `PackageOptionInput`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PledgeOption {
    /// Quantity of the option.
    pub amount: u32,
    /// Unit price in Rappen.
    pub price: u32,
    /// Package option identifier.
    pub template_id: String,
}

/// Contact data of an anonymous visitor. Mirrors the GraphQL `UserInput`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PledgeUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// How a pledge is paid. Serialized as the GraphQL `PaymentMethod` enum.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// Paper payment slip. Listed but not selectable in this form.
    PaymentSlip,
    /// Credit card, tokenized with Stripe.
    Stripe,
    /// PostFinance Card, paid on the PostFinance e-payment page.
    PostFinanceCard,
    /// PayPal, paid on the PayPal checkout page.
    PayPal,
}

impl PaymentMethod {
    /// Display order of the method picker.
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::PaymentSlip,
        PaymentMethod::Stripe,
        PaymentMethod::PostFinanceCard,
        PaymentMethod::PayPal,
    ];

    pub fn is_enabled(self) -> bool {
        !matches!(self, PaymentMethod::PaymentSlip)
    }

    /// The GraphQL enum value, also used as the radio input value.
    pub fn key(self) -> &'static str {
        match self {
            PaymentMethod::PaymentSlip => "PAYMENTSLIP",
            PaymentMethod::Stripe => "STRIPE",
            PaymentMethod::PostFinanceCard => "POSTFINANCECARD",
            PaymentMethod::PayPal => "PAYPAL",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.key() == key)
    }
}

/// The signed-in account, if any.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Me {
    pub id: String,
    pub email: String,
}

/// Semantic content of a pledge, sent to `submitPledge`.
///
/// Field order is significant: it is the order [`PledgeDraft::hash`]
/// flattens the draft in.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PledgeDraft {
    /// Total in Rappen.
    pub total: u32,
    pub options: Vec<PledgeOption>,
    pub reason: Option<String>,
    pub user: Option<PledgeUser>,
}

impl PledgeDraft {
    /// Build the draft from what the surrounding pledge form collected.
    ///
    /// A signed-in visitor is known to the backend, so the contact data is
    /// left out and does not take part in the hash either.
    pub fn new(
        total: u32,
        options: Vec<PledgeOption>,
        reason: Option<String>,
        user: Option<PledgeUser>,
        me: Option<&Me>,
    ) -> Self {
        Self {
            total,
            options,
            reason,
            user: if me.is_some() { None } else { user },
        }
    }

    /// Idempotency hash of this draft.
    pub fn hash(&self) -> String {
        hash_of(self)
    }
}
