//! Hidden-form parameters for the redirect-based payment providers.
//!
//! Both providers are paid by POSTing a form to their hosted payment page.
//! The builders here return the exact, ordered list of hidden fields each
//! provider expects; [`Navigator::post_form`](crate::navigator::Navigator::post_form)
//! turns them into a submitted form.

pub mod paypal;
pub mod postfinance;

/// One hidden form field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub key: &'static str,
    pub value: String,
}

impl Param {
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// Rappen to francs with two decimals, e.g. `12050` to `"120.50"`.
pub fn format_francs(rappen: u32) -> String {
    format!("{}.{:02}", rappen / 100, rappen % 100)
}
