//! Checkout configuration.
//!
//! Keys, form actions and endpoints are handed to the checkout by the host
//! page, typically as a JSON blob rendered into the document at build time.
//! [`CheckoutConfig::default`] carries test-mode values.

use serde::Deserialize;

/// Errors produced while loading a [`CheckoutConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing config value: {0}")]
    Missing(&'static str),
    #[error("stripe publishable key must start with pk_, got {0}")]
    SecretKey(String),
}

/// Everything the checkout needs to talk to its collaborators.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CheckoutConfig {
    /// GraphQL endpoint of the pledge backend.
    pub api_url: String,
    /// ISO currency code of every pledge.
    pub currency: String,
    /// Route of the thank-you page, receives `id` and `email` as query.
    pub merci_path: String,
    /// `tracing` filter directive for the browser console, e.g. `"info"`.
    pub log_level: String,
    pub stripe: StripeConfig,
    pub postfinance: PostFinanceConfig,
    pub paypal: PayPalConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct StripeConfig {
    pub publishable_key: String,
}

/// PostFinance e-Commerce hosted payment page.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PostFinanceConfig {
    pub form_action: String,
    pub pspid: String,
    /// SHA-IN passphrase configured in the PostFinance back office.
    pub sha_in: String,
    pub language: String,
    /// Usage note PostFinance shows when storing the card alias.
    pub alias_usage: String,
    pub accept_url: String,
    pub exception_url: String,
    pub decline_url: String,
    pub cancel_url: String,
}

/// PayPal Website Payments Standard.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PayPalConfig {
    pub form_action: String,
    /// Merchant account email or id.
    pub business: String,
    pub return_url: String,
    pub cancel_url: String,
    pub locale: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001/graphql".to_string(),
            currency: "CHF".to_string(),
            merci_path: "/merci".to_string(),
            log_level: "info".to_string(),
            stripe: StripeConfig::default(),
            postfinance: PostFinanceConfig::default(),
            paypal: PayPalConfig::default(),
        }
    }
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            publishable_key: "pk_test_placeholder".to_string(),
        }
    }
}

impl Default for PostFinanceConfig {
    fn default() -> Self {
        Self {
            form_action: "https://e-payment.postfinance.ch/ncol/test/orderstandard.asp".to_string(),
            pspid: "TEST".to_string(),
            sha_in: String::new(),
            language: "de_DE".to_string(),
            alias_usage: String::new(),
            accept_url: String::new(),
            exception_url: String::new(),
            decline_url: String::new(),
            cancel_url: String::new(),
        }
    }
}

impl Default for PayPalConfig {
    fn default() -> Self {
        Self {
            form_action: "https://www.sandbox.paypal.com/cgi-bin/webscr".to_string(),
            business: String::new(),
            return_url: String::new(),
            cancel_url: String::new(),
            locale: "CH".to_string(),
        }
    }
}

impl CheckoutConfig {
    /// Parse and validate a JSON document. Absent keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.is_empty() {
            return Err(ConfigError::Missing("api_url"));
        }
        if self.currency.is_empty() {
            return Err(ConfigError::Missing("currency"));
        }
        if self.postfinance.form_action.is_empty() {
            return Err(ConfigError::Missing("postfinance.form_action"));
        }
        if self.paypal.form_action.is_empty() {
            return Err(ConfigError::Missing("paypal.form_action"));
        }
        // A secret key in a browser bundle is a leak, refuse to start.
        if !self.stripe.publishable_key.starts_with("pk_") {
            let prefix: String = self.stripe.publishable_key.chars().take(3).collect();
            return Err(ConfigError::SecretKey(prefix));
        }
        Ok(())
    }
}
