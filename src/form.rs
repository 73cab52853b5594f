//! Card form state and field validation.
//!
//! Field state is kept as three maps (value, error, dirty) keyed by field
//! name. An error is only shown once its field is dirty, so a blank form
//! does not greet the visitor with red text; the submit gate marks every
//! erroring field dirty to reveal them all at once.

use std::collections::{BTreeMap, BTreeSet};

use crate::gateway::{CardDetails, CardValidator};
use crate::messages;

pub const CARD_NUMBER: &str = "cardNumber";
pub const CARD_MONTH: &str = "cardMonth";
pub const CARD_YEAR: &str = "cardYear";
pub const CARD_CVC: &str = "cardCVC";

/// Card fields in display order.
pub const CARD_FIELDS: [&str; 4] = [CARD_NUMBER, CARD_MONTH, CARD_YEAR, CARD_CVC];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormState {
    pub values: BTreeMap<String, String>,
    /// Only fields that currently have an error are present.
    pub errors: BTreeMap<String, String>,
    pub dirty: BTreeSet<String>,
}

/// An edit of a single field, with its freshly computed error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldUpdate {
    pub name: String,
    pub value: String,
    pub error: Option<String>,
    pub dirty: bool,
}

impl FormState {
    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn is_dirty(&self, name: &str) -> bool {
        self.dirty.contains(name)
    }

    /// The error to render next to a field.
    pub fn visible_error(&self, name: &str) -> Option<&str> {
        self.error(name).filter(|_| self.is_dirty(name))
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.values().cloned().collect()
    }

    fn set_error(&mut self, name: &str, error: Option<String>) {
        match error {
            Some(error) => self.errors.insert(name.to_string(), error),
            None => self.errors.remove(name),
        };
    }

    /// Reveal every current error.
    pub fn mark_errors_dirty(&self) -> FormState {
        let mut next = self.clone();
        next.dirty.extend(self.errors.keys().cloned());
        next
    }

    /// Raw card data for tokenization.
    pub fn card_details(&self) -> CardDetails {
        CardDetails {
            number: self.value(CARD_NUMBER).replace(' ', ""),
            cvc: self.value(CARD_CVC).to_string(),
            exp_month: self.value(CARD_MONTH).to_string(),
            exp_year: self.value(CARD_YEAR).to_string(),
        }
    }
}

/// Merge field updates into the form state.
pub fn merge_fields(form: &FormState, updates: impl IntoIterator<Item = FieldUpdate>) -> FormState {
    let mut next = form.clone();
    for update in updates {
        next.set_error(&update.name, update.error);
        if update.dirty {
            next.dirty.insert(update.name.clone());
        } else {
            next.dirty.remove(&update.name);
        }
        next.values.insert(update.name, update.value);
    }
    next
}

pub fn validate_card_number<V: CardValidator + ?Sized>(validator: &V, value: &str) -> Option<String> {
    if value.is_empty() {
        return Some(messages::CARD_NUMBER_EMPTY.to_string());
    }
    if !validator.validate_card_number(value) {
        return Some(messages::CARD_NUMBER_INVALID.to_string());
    }
    None
}

pub fn validate_cvc<V: CardValidator + ?Sized>(validator: &V, value: &str) -> Option<String> {
    if value.is_empty() {
        return Some(messages::CARD_CVC_EMPTY.to_string());
    }
    if !validator.validate_cvc(value) {
        return Some(messages::CARD_CVC_INVALID.to_string());
    }
    None
}

/// Recompute the month/year errors.
///
/// The combined expiry check only runs once both fields hold a value and
/// both were edited; until then each field only reports being empty.
pub fn apply_expiry_errors<V: CardValidator + ?Sized>(form: &mut FormState, validator: &V) {
    let month = form.value(CARD_MONTH).to_string();
    let year = form.value(CARD_YEAR).to_string();

    let both_edited = form.is_dirty(CARD_MONTH) && form.is_dirty(CARD_YEAR);
    if !month.is_empty() && !year.is_empty() && both_edited && !validator.validate_expiry(&month, &year)
    {
        form.set_error(CARD_MONTH, Some(messages::CARD_MONTH_INVALID.to_string()));
        form.set_error(CARD_YEAR, Some(messages::CARD_YEAR_INVALID.to_string()));
    } else {
        form.set_error(
            CARD_MONTH,
            month.is_empty().then(|| messages::CARD_MONTH_EMPTY.to_string()),
        );
        form.set_error(
            CARD_YEAR,
            year.is_empty().then(|| messages::CARD_YEAR_EMPTY.to_string()),
        );
    }
}

/// Reducer step for an edit of one card field.
pub fn card_field_changed<V: CardValidator + ?Sized>(
    form: &FormState,
    validator: &V,
    name: &str,
    value: &str,
) -> FormState {
    let error = match name {
        CARD_NUMBER => validate_card_number(validator, value),
        CARD_CVC => validate_cvc(validator, value),
        _ => None,
    };
    let mut next = merge_fields(
        form,
        [FieldUpdate {
            name: name.to_string(),
            value: value.to_string(),
            error,
            dirty: true,
        }],
    );
    apply_expiry_errors(&mut next, validator);
    next
}

/// A blank card form: every field reports being empty, nothing is dirty.
pub fn initial_card_form<V: CardValidator + ?Sized>(validator: &V) -> FormState {
    let updates = [CARD_NUMBER, CARD_CVC].map(|name| FieldUpdate {
        name: name.to_string(),
        value: String::new(),
        error: match name {
            CARD_NUMBER => validate_card_number(validator, ""),
            _ => validate_cvc(validator, ""),
        },
        dirty: false,
    });
    let mut form = merge_fields(&FormState::default(), updates);
    apply_expiry_errors(&mut form, validator);
    form
}
