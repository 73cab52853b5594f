//! Checkout state and its reducer.
//!
//! Everything the checkout shows is derived from one [`SubmissionState`].
//! It only changes through [`SubmissionState::apply`], which makes a
//! checkout attempt replayable from the list of actions the orchestrator
//! dispatched.

use std::fmt;
use std::rc::Rc;

use yew::Reducible;

use crate::form::{self, FormState};
use crate::gateway::CardValidator;
use crate::pledge::{PaymentMethod, PledgeDraft};

/// Card validators the reducer runs on every card edit.
#[derive(Clone, Default)]
pub struct Validators(Option<Rc<dyn CardValidator>>);

/// Stand-in while no validators are installed: nothing is valid.
struct Unavailable;

impl CardValidator for Unavailable {
    fn validate_card_number(&self, _number: &str) -> bool {
        false
    }

    fn validate_cvc(&self, _cvc: &str) -> bool {
        false
    }

    fn validate_expiry(&self, _month: &str, _year: &str) -> bool {
        false
    }
}

impl Validators {
    pub fn new(validator: Rc<dyn CardValidator>) -> Self {
        Self(Some(validator))
    }

    fn get(&self) -> &dyn CardValidator {
        match &self.0 {
            Some(validator) => validator.as_ref(),
            None => &Unavailable,
        }
    }
}

impl fmt::Debug for Validators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Validators(..)"),
            None => f.write_str("Validators(None)"),
        }
    }
}

impl PartialEq for Validators {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Eq for Validators {}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmissionState {
    pub payment_method: Option<PaymentMethod>,
    /// Pledge created for [`pledge_hash`](Self::pledge_hash). Set and
    /// cleared together with it.
    pub pledge_id: Option<String>,
    pub pledge_hash: Option<String>,
    pub user_id: Option<String>,
    /// Progress text. While set, the checkout is busy and ignores submits.
    pub loading: Option<String>,
    pub submit_error: Option<String>,
    pub payment_error: Option<String>,
    pub sign_in_error: Option<String>,
    /// The visitor must confirm their email address before paying.
    pub email_verify: bool,
    /// Show the aggregated error list above the pay button.
    pub show_errors: bool,
    pub form: FormState,
    pub validators: Validators,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    SelectPaymentMethod(PaymentMethod),
    /// The visitor edited one card field.
    CardFieldChanged { name: String, value: String },
    /// The submit gate refused: reveal every field error and the list.
    RevealErrors,
    /// The pledge content now hashes to `hash`.
    DraftChanged { hash: String },
    Loading(String),
    EmailVerifyRequired,
    PledgeSubmitted {
        pledge_id: String,
        user_id: Option<String>,
        hash: String,
    },
    SubmitFailed(String),
    SourceCreated,
    PaymentFailed(String),
    SignInFailed(String),
}

impl SubmissionState {
    /// State for a pledge that already exists on the backend, e.g. when the
    /// visitor comes back from a cancelled provider payment.
    pub fn with_base_pledge(pledge_id: impl Into<String>, draft: &PledgeDraft) -> Self {
        Self {
            pledge_id: Some(pledge_id.into()),
            pledge_hash: Some(draft.hash()),
            ..Self::default()
        }
    }

    /// Install the card validators and reset the card form to blank.
    pub fn with_validators(self, validator: Rc<dyn CardValidator>) -> Self {
        let validators = Validators::new(validator);
        Self {
            form: form::initial_card_form(validators.get()),
            validators,
            ..self
        }
    }

    pub fn is_busy(&self) -> bool {
        self.loading.is_some()
    }

    /// The stored pledge, if it may be paid for a draft hashing to `hash`.
    pub fn reusable_pledge(&self, hash: &str) -> Option<&str> {
        if self.submit_error.is_some() || self.pledge_hash.as_deref() != Some(hash) {
            return None;
        }
        self.pledge_id.as_deref()
    }

    pub fn apply(&self, action: Action) -> Self {
        let mut next = self.clone();
        match action {
            Action::SelectPaymentMethod(method) => {
                next.payment_method = Some(method);
                next.show_errors = false;
            }
            Action::CardFieldChanged { name, value } => {
                next.form = form::card_field_changed(&self.form, self.validators.get(), &name, &value);
            }
            Action::RevealErrors => {
                next.form = self.form.mark_errors_dirty();
                next.show_errors = true;
            }
            Action::DraftChanged { hash } => {
                if next.pledge_hash.as_deref().is_some_and(|stored| stored != hash) {
                    next.pledge_id = None;
                    next.pledge_hash = None;
                }
            }
            Action::Loading(message) => next.loading = Some(message),
            Action::EmailVerifyRequired => {
                next.loading = None;
                next.email_verify = true;
            }
            Action::PledgeSubmitted {
                pledge_id,
                user_id,
                hash,
            } => {
                next.loading = None;
                next.pledge_id = Some(pledge_id);
                next.pledge_hash = Some(hash);
                next.user_id = user_id;
                next.submit_error = None;
            }
            Action::SubmitFailed(message) => {
                next.loading = None;
                next.pledge_id = None;
                next.pledge_hash = None;
                next.submit_error = Some(message);
            }
            Action::SourceCreated => {
                next.loading = None;
                next.payment_error = None;
            }
            Action::PaymentFailed(message) => {
                next.loading = None;
                next.payment_error = Some(message);
            }
            Action::SignInFailed(message) => {
                next.loading = None;
                next.sign_in_error = Some(message);
            }
        }
        next
    }
}

impl Reducible for SubmissionState {
    type Action = Action;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        Rc::new(self.apply(action))
    }
}

/// Fold a list of actions over `state`.
pub fn replay(state: &SubmissionState, actions: impl IntoIterator<Item = Action>) -> SubmissionState {
    actions
        .into_iter()
        .fold(state.clone(), |state, action| state.apply(action))
}
