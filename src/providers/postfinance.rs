//! PostFinance Card via the PostFinance e-Commerce hosted payment page.
//!
//! The card is charged on PostFinance's page; the backend learns the result
//! from PostFinance's post-sale request. The form carries the pledge id as
//! `ORDERID` and the backend user id as `ALIAS`, so PostFinance stores the
//! card under that user for later recurring charges.
//!
//! Every request is signed with SHA-IN: all non-empty parameters sorted by
//! name, each written as `NAME=value` followed by the passphrase, then
//! hashed with SHA-256 and hex-encoded in upper case.

use sha2::{Digest, Sha256};

use super::Param;
use crate::config::PostFinanceConfig;

/// Order data that goes into the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostFinanceOrder<'a> {
    /// Backend user id, used as the card alias. Unknown for a pledge that
    /// was only just created by an anonymous visitor in some flows.
    pub alias: Option<&'a str>,
    /// Pledge id.
    pub order_id: &'a str,
    /// Amount in Rappen.
    pub amount: u32,
}

/// Hidden fields for the PostFinance form, `SHASIGN` last.
pub fn params(config: &PostFinanceConfig, currency: &str, order: &PostFinanceOrder) -> Vec<Param> {
    let mut params: Vec<Param> = [
        Param::new("PSPID", config.pspid.as_str()),
        Param::new("ORDERID", order.order_id),
        Param::new("AMOUNT", order.amount.to_string()),
        Param::new("CURRENCY", currency),
        Param::new("LANGUAGE", config.language.as_str()),
        Param::new("ALIAS", order.alias.unwrap_or_default()),
        Param::new("ALIASUSAGE", config.alias_usage.as_str()),
        Param::new("ACCEPTURL", config.accept_url.as_str()),
        Param::new("EXCEPTIONURL", config.exception_url.as_str()),
        Param::new("DECLINEURL", config.decline_url.as_str()),
        Param::new("CANCELURL", config.cancel_url.as_str()),
    ]
    .into_iter()
    .filter(|param| !param.value.is_empty())
    .collect();

    let signature = sha_sign(&params, &config.sha_in);
    params.push(Param::new("SHASIGN", signature));
    params
}

/// SHA-IN signature over `params`.
pub fn sha_sign(params: &[Param], passphrase: &str) -> String {
    let mut sorted: Vec<&Param> = params.iter().filter(|p| !p.value.is_empty()).collect();
    sorted.sort_by_key(|p| p.key);

    let mut hasher = Sha256::new();
    for param in sorted {
        hasher.update(param.key.as_bytes());
        hasher.update(b"=");
        hasher.update(param.value.as_bytes());
        hasher.update(passphrase.as_bytes());
    }
    hex::encode_upper(hasher.finalize())
}
