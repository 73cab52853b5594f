//! PayPal Website Payments Standard ("Buy Now" button form).
//!
//! PayPal identifies the purchase by `item_name`, which carries the pledge
//! id; the backend matches PayPal's IPN callback against it.

use super::{format_francs, Param};
use crate::config::PayPalConfig;

/// Order data that goes into the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayPalOrder<'a> {
    /// Pledge id.
    pub item_name: &'a str,
    /// Amount in Rappen.
    pub amount: u32,
}

/// Hidden fields for the PayPal form.
pub fn params(config: &PayPalConfig, currency: &str, order: &PayPalOrder) -> Vec<Param> {
    vec![
        Param::new("cmd", "_xclick"),
        Param::new("business", config.business.as_str()),
        Param::new("item_name", order.item_name),
        Param::new("amount", format_francs(order.amount)),
        Param::new("currency_code", currency),
        Param::new("return", config.return_url.as_str()),
        Param::new("cancel_return", config.cancel_url.as_str()),
        Param::new("no_shipping", "1"),
        Param::new("lc", config.locale.as_str()),
    ]
}
