//! The pledge submission flow.
//!
//! [`Checkout::submit`] runs one checkout attempt against a snapshot of the
//! [`SubmissionState`]:
//!
//! 1. refuse while busy, or while the form has errors;
//! 2. reuse the stored pledge if nothing that went into it changed,
//!    otherwise create a new one (`submitPledge`);
//! 3. pay it with the chosen method: tokenize the card and call
//!    `payPledge`, or hand over to PostFinance / PayPal with a form POST;
//! 4. after a card payment, sign an anonymous visitor in and move on to the
//!    thank-you page.
//!
//! Every state change is reported through `dispatch` as an [`Action`]; the
//! flow itself holds no state between attempts.

use crate::api::{PayPledgeInput, PledgeApi};
use crate::config::CheckoutConfig;
use crate::gateway::{CardDetails, CardGateway, SourceRequest};
use crate::messages;
use crate::navigator::Navigator;
use crate::pledge::{Me, PaymentMethod, PledgeDraft};
use crate::providers::{paypal, postfinance, Param};
use crate::state::{Action, SubmissionState};

/// What the visitor wants to pay, as collected by the surrounding form.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitRequest<'a> {
    pub draft: &'a PledgeDraft,
    pub me: Option<&'a Me>,
    /// Errors of the surrounding form (amount, options, contact data).
    pub external_errors: &'a [String],
}

impl SubmitRequest<'_> {
    /// Address used for sign-in and the thank-you page.
    fn email(&self) -> Option<&str> {
        let email = match self.me {
            Some(me) => Some(me.email.as_str()),
            None => self.draft.user.as_ref().map(|user| user.email.as_str()),
        };
        email.filter(|email| !email.is_empty())
    }
}

/// How the chosen payment method is carried out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentRoute {
    /// Tokenize the card, then `payPledge`.
    Card(CardDetails),
    /// POST to the PostFinance payment page.
    BankCard(Vec<Param>),
    /// POST to the PayPal checkout.
    Wallet(Vec<Param>),
    /// Not payable from this form.
    Unsupported(PaymentMethod),
}

/// Result of one payment handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The backend accepted the card payment.
    Completed { pledge_id: String },
    /// The browser is on its way to the provider.
    Redirected,
    /// The card was refused by the gateway.
    FieldError {
        param: Option<String>,
        message: String,
    },
    /// Payment or redirect failed.
    ProviderError(String),
    /// The method or card cannot be handled here.
    Unsupported(String),
}

/// Result of a whole checkout attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another attempt is still running.
    Busy,
    /// The form has errors; nothing was sent.
    Invalid(Vec<String>),
    /// The visitor must confirm their email address first.
    EmailVerify,
    SubmitFailed(String),
    Payment(PaymentOutcome),
    /// Paid, but signing the visitor in failed.
    SignInFailed { pledge_id: String, message: String },
}

/// Errors that block a submit, in display order, or the chosen method.
pub fn validate(state: &SubmissionState, external_errors: &[String]) -> Result<PaymentMethod, Vec<String>> {
    let mut errors: Vec<String> = external_errors
        .iter()
        .filter(|e| !e.is_empty())
        .cloned()
        .collect();

    let method = state.payment_method.filter(|m| m.is_enabled());
    if method == Some(PaymentMethod::Stripe) {
        errors.extend(state.form.error_messages());
    }
    if method.is_none() {
        errors.push(messages::CHOOSE_PAYMENT_METHOD.to_string());
    }

    match method {
        Some(method) if errors.is_empty() => Ok(method),
        _ => Err(errors),
    }
}

/// The submission flow, wired to its collaborators.
pub struct Checkout<A, G, N> {
    api: A,
    gateway: G,
    navigator: N,
    config: CheckoutConfig,
}

impl<A, G, N> Checkout<A, G, N>
where
    A: PledgeApi,
    G: CardGateway,
    N: Navigator,
{
    pub fn new(api: A, gateway: G, navigator: N, config: CheckoutConfig) -> Self {
        Self {
            api,
            gateway,
            navigator,
            config,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Run one checkout attempt. See the module docs for the steps.
    pub async fn submit<D>(
        &self,
        state: &SubmissionState,
        request: &SubmitRequest<'_>,
        dispatch: D,
    ) -> SubmitOutcome
    where
        D: Fn(Action),
    {
        if state.is_busy() {
            tracing::debug!("submit ignored, checkout busy");
            return SubmitOutcome::Busy;
        }

        let method = match validate(state, request.external_errors) {
            Ok(method) => method,
            Err(errors) => {
                tracing::debug!(count = errors.len(), "submit blocked by form errors");
                dispatch(Action::RevealErrors);
                return SubmitOutcome::Invalid(errors);
            }
        };

        let hash = request.draft.hash();
        if let Some(pledge_id) = state.reusable_pledge(&hash) {
            tracing::info!(pledge_id, "pledge unchanged, paying existing pledge");
            let user_id = state.user_id.as_deref();
            return self
                .pay(method, pledge_id, user_id, state, request, &dispatch)
                .await;
        }

        dispatch(Action::Loading(messages::LOADING_SUBMIT.to_string()));
        let response = match self.api.submit_pledge(request.draft).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "submitPledge failed");
                let message = e.display_message();
                dispatch(Action::SubmitFailed(message.clone()));
                return SubmitOutcome::SubmitFailed(message);
            }
        };

        if response.needs_email_verification() {
            tracing::info!("email verification required before payment");
            dispatch(Action::EmailVerifyRequired);
            return SubmitOutcome::EmailVerify;
        }

        tracing::info!(pledge_id = %response.pledge_id, "pledge submitted");
        dispatch(Action::PledgeSubmitted {
            pledge_id: response.pledge_id.clone(),
            user_id: response.user_id.clone(),
            hash,
        });
        self.pay(
            method,
            &response.pledge_id,
            response.user_id.as_deref(),
            state,
            request,
            &dispatch,
        )
        .await
    }

    /// Resolve the chosen method into a [`PaymentRoute`].
    pub fn route(
        &self,
        method: PaymentMethod,
        pledge_id: &str,
        user_id: Option<&str>,
        state: &SubmissionState,
        total: u32,
    ) -> PaymentRoute {
        let currency = self.config.currency.as_str();
        match method {
            PaymentMethod::Stripe => PaymentRoute::Card(state.form.card_details()),
            PaymentMethod::PostFinanceCard => PaymentRoute::BankCard(postfinance::params(
                &self.config.postfinance,
                currency,
                &postfinance::PostFinanceOrder {
                    alias: user_id,
                    order_id: pledge_id,
                    amount: total,
                },
            )),
            PaymentMethod::PayPal => PaymentRoute::Wallet(paypal::params(
                &self.config.paypal,
                currency,
                &paypal::PayPalOrder {
                    item_name: pledge_id,
                    amount: total,
                },
            )),
            PaymentMethod::PaymentSlip => PaymentRoute::Unsupported(method),
        }
    }

    async fn pay<D>(
        &self,
        method: PaymentMethod,
        pledge_id: &str,
        user_id: Option<&str>,
        state: &SubmissionState,
        request: &SubmitRequest<'_>,
        dispatch: &D,
    ) -> SubmitOutcome
    where
        D: Fn(Action),
    {
        let route = self.route(method, pledge_id, user_id, state, request.draft.total);
        let outcome = match route {
            PaymentRoute::Card(card) => self.pay_with_card(pledge_id, card, dispatch).await,
            PaymentRoute::BankCard(params) => self.redirect(
                &self.config.postfinance.form_action,
                &params,
                messages::LOADING_POSTFINANCE,
                dispatch,
            ),
            PaymentRoute::Wallet(params) => self.redirect(
                &self.config.paypal.form_action,
                &params,
                messages::LOADING_PAYPAL,
                dispatch,
            ),
            PaymentRoute::Unsupported(method) => {
                tracing::warn!(?method, "payment method not payable here");
                let message = messages::CHOOSE_PAYMENT_METHOD.to_string();
                dispatch(Action::PaymentFailed(message.clone()));
                PaymentOutcome::Unsupported(message)
            }
        };

        match outcome {
            PaymentOutcome::Completed { pledge_id } => self.finish(pledge_id, request, dispatch).await,
            outcome => SubmitOutcome::Payment(outcome),
        }
    }

    async fn pay_with_card<D>(&self, pledge_id: &str, card: CardDetails, dispatch: &D) -> PaymentOutcome
    where
        D: Fn(Action),
    {
        dispatch(Action::Loading(messages::LOADING_STRIPE.to_string()));
        let request = SourceRequest::reusable_card(card, &self.config.currency);
        let source = match self.gateway.create_source(request).await {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(error_type = ?e.error_type, param = ?e.param, "card source refused");
                dispatch(Action::PaymentFailed(e.message.clone()));
                return PaymentOutcome::FieldError {
                    param: e.param,
                    message: e.message,
                };
            }
        };
        dispatch(Action::SourceCreated);

        if source.requires_three_d_secure() {
            tracing::warn!(source = %source.id, "card requires 3-D Secure, refusing");
            let message = messages::THREE_D_SECURE_UNSUPPORTED.to_string();
            dispatch(Action::PaymentFailed(message.clone()));
            return PaymentOutcome::Unsupported(message);
        }

        dispatch(Action::Loading(messages::LOADING_PAY.to_string()));
        let input = PayPledgeInput {
            pledge_id: pledge_id.to_string(),
            method: PaymentMethod::Stripe,
            source_id: Some(source.id.clone()),
            psp_payload: source.psp_payload(),
        };
        match self.api.pay_pledge(&input).await {
            Ok(response) => {
                tracing::info!(pledge_id = %response.pledge_id, "pledge paid");
                PaymentOutcome::Completed {
                    pledge_id: response.pledge_id,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "payPledge failed");
                let message = e.display_message();
                dispatch(Action::PaymentFailed(message.clone()));
                PaymentOutcome::ProviderError(message)
            }
        }
    }

    fn redirect<D>(&self, action: &str, params: &[Param], loading: &str, dispatch: &D) -> PaymentOutcome
    where
        D: Fn(Action),
    {
        dispatch(Action::Loading(loading.to_string()));
        match self.navigator.post_form(action, params) {
            Ok(()) => PaymentOutcome::Redirected,
            Err(e) => {
                tracing::error!(error = %e, action, "provider redirect failed");
                let message = messages::REDIRECT_FAILED.to_string();
                dispatch(Action::PaymentFailed(message.clone()));
                PaymentOutcome::ProviderError(message)
            }
        }
    }

    /// Sign an anonymous visitor in, then show the thank-you page.
    async fn finish<D>(&self, pledge_id: String, request: &SubmitRequest<'_>, dispatch: &D) -> SubmitOutcome
    where
        D: Fn(Action),
    {
        let email = request.email();

        if request.me.is_none() {
            match email {
                Some(email) => {
                    if let Err(e) = self.api.sign_in(email).await {
                        tracing::error!(error = %e, "signIn after payment failed");
                        let message = e.display_message();
                        dispatch(Action::SignInFailed(message.clone()));
                        return SubmitOutcome::SignInFailed { pledge_id, message };
                    }
                }
                None => tracing::warn!("anonymous pledge without email, skipping sign-in"),
            }
        }

        let mut query = vec![("id", pledge_id.as_str())];
        if let Some(email) = email {
            query.push(("email", email));
        }
        if let Err(e) = self.navigator.push(&self.config.merci_path, &query) {
            tracing::error!(error = %e, "navigation to thank-you page failed");
        }
        SubmitOutcome::Payment(PaymentOutcome::Completed { pledge_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, PledgeResponse, SignInResponse};
    use crate::form::{self, tests::ScriptedValidators, CARD_CVC, CARD_MONTH, CARD_NUMBER, CARD_YEAR};
    use crate::gateway::{CardValidator, Source, SourceError};
    use crate::navigator::NavigationError;
    use crate::pledge::{PledgeOption, PledgeUser};
    use crate::state::replay;
    use serde_json::json;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct MockApi {
        submit_calls: Cell<usize>,
        submit_fails: Cell<bool>,
        email_verify: Cell<bool>,
        pay_fails: Cell<bool>,
        sign_in_fails: Cell<bool>,
        payments: RefCell<Vec<PayPledgeInput>>,
        sign_ins: RefCell<Vec<String>>,
    }

    impl PledgeApi for MockApi {
        async fn submit_pledge(&self, _draft: &PledgeDraft) -> Result<PledgeResponse, ApiError> {
            self.submit_calls.set(self.submit_calls.get() + 1);
            if self.submit_fails.get() {
                return Err(ApiError::GraphQl(vec!["Total zu tief".into()]));
            }
            Ok(PledgeResponse {
                pledge_id: format!("pl_{}", self.submit_calls.get()),
                user_id: Some("u_1".into()),
                email_verify: Some(self.email_verify.get()),
            })
        }

        async fn pay_pledge(&self, input: &PayPledgeInput) -> Result<PledgeResponse, ApiError> {
            self.payments.borrow_mut().push(input.clone());
            if self.pay_fails.get() {
                return Err(ApiError::Http(gloo_net::Error::GlooError(
                    "NetworkError when attempting to fetch resource".into(),
                )));
            }
            Ok(PledgeResponse {
                pledge_id: input.pledge_id.clone(),
                user_id: Some("u_1".into()),
                email_verify: None,
            })
        }

        async fn sign_in(&self, email: &str) -> Result<SignInResponse, ApiError> {
            self.sign_ins.borrow_mut().push(email.to_string());
            if self.sign_in_fails.get() {
                return Err(ApiError::GraphQl(vec!["Anmeldung fehlgeschlagen".into()]));
            }
            Ok(SignInResponse {
                phrase: "Rote Katze".into(),
            })
        }
    }

    struct MockGateway {
        result: RefCell<Result<Source, SourceError>>,
        requests: RefCell<Vec<SourceRequest>>,
    }

    impl MockGateway {
        fn with_source(raw: serde_json::Value) -> Self {
            Self {
                result: RefCell::new(Source::from_json(raw)),
                requests: RefCell::default(),
            }
        }

        fn ok() -> Self {
            Self::with_source(json!({ "id": "src_1", "card": { "three_d_secure": "optional" } }))
        }
    }

    impl CardValidator for MockGateway {
        fn validate_card_number(&self, number: &str) -> bool {
            ScriptedValidators.validate_card_number(number)
        }

        fn validate_cvc(&self, cvc: &str) -> bool {
            ScriptedValidators.validate_cvc(cvc)
        }

        fn validate_expiry(&self, month: &str, year: &str) -> bool {
            ScriptedValidators.validate_expiry(month, year)
        }
    }

    impl CardGateway for MockGateway {
        async fn create_source(&self, request: SourceRequest) -> Result<Source, SourceError> {
            self.requests.borrow_mut().push(request);
            self.result.borrow().clone()
        }
    }

    #[derive(Default)]
    struct MockNavigator {
        fails: Cell<bool>,
        posts: RefCell<Vec<(String, Vec<Param>)>>,
        pushes: RefCell<Vec<(String, Vec<(String, String)>)>>,
    }

    impl Navigator for MockNavigator {
        fn post_form(&self, action: &str, params: &[Param]) -> Result<(), NavigationError> {
            if self.fails.get() {
                return Err(NavigationError::NoWindow);
            }
            self.posts
                .borrow_mut()
                .push((action.to_string(), params.to_vec()));
            Ok(())
        }

        fn push(&self, path: &str, query: &[(&str, &str)]) -> Result<(), NavigationError> {
            let query = query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            self.pushes.borrow_mut().push((path.to_string(), query));
            Ok(())
        }
    }

    type TestCheckout = Checkout<MockApi, MockGateway, MockNavigator>;

    fn checkout(gateway: MockGateway) -> TestCheckout {
        Checkout::new(
            MockApi::default(),
            gateway,
            MockNavigator::default(),
            CheckoutConfig::default(),
        )
    }

    fn draft(total: u32) -> PledgeDraft {
        PledgeDraft {
            total,
            options: vec![PledgeOption {
                amount: 1,
                price: total,
                template_id: "P1".into(),
            }],
            reason: None,
            user: None,
        }
    }

    fn anonymous_draft(total: u32) -> PledgeDraft {
        PledgeDraft {
            user: Some(PledgeUser {
                email: "anna@example.ch".into(),
                first_name: "Anna".into(),
                last_name: "Muster".into(),
            }),
            ..draft(total)
        }
    }

    fn me() -> Me {
        Me {
            id: "u_1".into(),
            email: "me@example.ch".into(),
        }
    }

    /// A complete, valid card form, typed in through the reducer.
    fn card_state() -> SubmissionState {
        let state = SubmissionState {
            payment_method: Some(PaymentMethod::Stripe),
            ..SubmissionState::default()
        }
        .with_validators(Rc::new(ScriptedValidators));
        let edits = [
            (CARD_NUMBER, "4242 4242 4242 4242"),
            (CARD_MONTH, "12"),
            (CARD_YEAR, "2031"),
            (CARD_CVC, "123"),
        ]
        .map(|(name, value)| Action::CardFieldChanged {
            name: name.to_string(),
            value: value.to_string(),
        });
        replay(&state, edits)
    }

    fn method_state(method: PaymentMethod) -> SubmissionState {
        SubmissionState {
            payment_method: Some(method),
            ..SubmissionState::default()
        }
    }

    /// Run one attempt and return its outcome and the resulting state.
    async fn attempt(
        checkout: &TestCheckout,
        state: &SubmissionState,
        request: &SubmitRequest<'_>,
    ) -> (SubmitOutcome, SubmissionState) {
        let actions = RefCell::new(Vec::new());
        let outcome = checkout
            .submit(state, request, |action| actions.borrow_mut().push(action))
            .await;
        (outcome, replay(state, actions.into_inner()))
    }

    #[tokio::test]
    async fn test_no_method_blocks_without_remote_calls() {
        let me = me();
        let checkout = checkout(MockGateway::ok());
        let draft = draft(12000);
        let request = SubmitRequest {
            draft: &draft,
            me: Some(&me),
            external_errors: &[],
        };

        let (outcome, state) = attempt(&checkout, &SubmissionState::default(), &request).await;

        assert_eq!(
            outcome,
            SubmitOutcome::Invalid(vec![messages::CHOOSE_PAYMENT_METHOD.to_string()])
        );
        assert!(state.show_errors);
        assert_eq!(checkout.api.submit_calls.get(), 0);
        assert!(checkout.api.payments.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_external_and_card_errors_are_aggregated() {
        let checkout = checkout(MockGateway::ok());
        let state = SubmissionState {
            form: form::initial_card_form(checkout.gateway()),
            ..method_state(PaymentMethod::Stripe)
        };
        let draft = draft(12000);
        let external = vec!["Betrag zu tief".to_string()];
        let request = SubmitRequest {
            draft: &draft,
            me: None,
            external_errors: &external,
        };

        let (outcome, state) = attempt(&checkout, &state, &request).await;

        let SubmitOutcome::Invalid(errors) = outcome else {
            panic!("expected Invalid, got {outcome:?}");
        };
        assert_eq!(errors.len(), 5);
        assert_eq!(errors[0], "Betrag zu tief");
        assert!(state.form.visible_error(CARD_NUMBER).is_some());
        assert_eq!(checkout.api.submit_calls.get(), 0);
    }

    #[test]
    fn test_card_errors_ignored_for_redirect_methods() {
        let checkout = checkout(MockGateway::ok());
        let state = SubmissionState {
            form: form::initial_card_form(checkout.gateway()),
            ..method_state(PaymentMethod::PayPal)
        };
        assert_eq!(validate(&state, &[]), Ok(PaymentMethod::PayPal));
    }

    #[tokio::test]
    async fn test_busy_checkout_ignores_submit() {
        let me = me();
        let checkout = checkout(MockGateway::ok());
        let state = SubmissionState {
            loading: Some(messages::LOADING_PAY.into()),
            ..card_state()
        };
        let draft = draft(12000);
        let request = SubmitRequest {
            draft: &draft,
            me: Some(&me),
            external_errors: &[],
        };

        let (outcome, _) = attempt(&checkout, &state, &request).await;
        assert_eq!(outcome, SubmitOutcome::Busy);
        assert_eq!(checkout.api.submit_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_card_payment_for_signed_in_visitor() {
        let me = me();
        let checkout = checkout(MockGateway::ok());
        let state = card_state();
        let draft = draft(12000);
        let request = SubmitRequest {
            draft: &draft,
            me: Some(&me),
            external_errors: &[],
        };

        let (outcome, state) = attempt(&checkout, &state, &request).await;

        assert_eq!(
            outcome,
            SubmitOutcome::Payment(PaymentOutcome::Completed {
                pledge_id: "pl_1".into()
            })
        );
        assert_eq!(state.pledge_id.as_deref(), Some("pl_1"));
        assert_eq!(state.pledge_hash, Some(draft.hash()));

        let payments = checkout.api.payments.borrow();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].method, PaymentMethod::Stripe);
        assert_eq!(payments[0].source_id.as_deref(), Some("src_1"));
        assert!(payments[0].psp_payload.contains("src_1"));

        let source_requests = checkout.gateway.requests.borrow();
        assert_eq!(source_requests[0].card.number, "4242424242424242");
        assert_eq!(source_requests[0].currency, "CHF");

        assert!(checkout.api.sign_ins.borrow().is_empty());
        let pushes = checkout.navigator.pushes.borrow();
        assert_eq!(pushes[0].0, "/merci");
        assert_eq!(
            pushes[0].1,
            [
                ("id".to_string(), "pl_1".to_string()),
                ("email".to_string(), "me@example.ch".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_unchanged_resubmission_reuses_pledge() {
        let me = me();
        let checkout = checkout(MockGateway::ok());
        checkout.api.pay_fails.set(true);
        let state = card_state();
        let draft = draft(12000);
        let request = SubmitRequest {
            draft: &draft,
            me: Some(&me),
            external_errors: &[],
        };

        let (first, state) = attempt(&checkout, &state, &request).await;
        assert!(matches!(
            first,
            SubmitOutcome::Payment(PaymentOutcome::ProviderError(_))
        ));

        checkout.api.pay_fails.set(false);
        let (second, _) = attempt(&checkout, &state, &request).await;
        assert!(matches!(
            second,
            SubmitOutcome::Payment(PaymentOutcome::Completed { .. })
        ));

        assert_eq!(checkout.api.submit_calls.get(), 1);
        let payments = checkout.api.payments.borrow();
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].pledge_id, "pl_1");
        assert_eq!(payments[1].pledge_id, "pl_1");
    }

    #[tokio::test]
    async fn test_changed_draft_creates_new_pledge() {
        let me = me();
        let checkout = checkout(MockGateway::ok());
        checkout.api.pay_fails.set(true);
        let state = card_state();

        let first_draft = draft(12000);
        let request = SubmitRequest {
            draft: &first_draft,
            me: Some(&me),
            external_errors: &[],
        };
        let (_, state) = attempt(&checkout, &state, &request).await;

        let second_draft = draft(24000);
        let request = SubmitRequest {
            draft: &second_draft,
            me: Some(&me),
            external_errors: &[],
        };
        let (_, state) = attempt(&checkout, &state, &request).await;

        assert_eq!(checkout.api.submit_calls.get(), 2);
        assert_eq!(state.pledge_id.as_deref(), Some("pl_2"));
        assert_eq!(state.pledge_hash, Some(second_draft.hash()));
    }

    #[tokio::test]
    async fn test_payment_network_error_keeps_pledge() {
        let me = me();
        let checkout = checkout(MockGateway::ok());
        checkout.api.pay_fails.set(true);
        let draft = draft(12000);
        let before = SubmissionState {
            pledge_id: Some("pl_7".into()),
            pledge_hash: Some(draft.hash()),
            ..card_state()
        };
        let request = SubmitRequest {
            draft: &draft,
            me: Some(&me),
            external_errors: &[],
        };

        let (outcome, after) = attempt(&checkout, &before, &request).await;

        assert!(matches!(
            outcome,
            SubmitOutcome::Payment(PaymentOutcome::ProviderError(_))
        ));
        assert!(after.payment_error.as_deref().is_some_and(|m| !m.is_empty()));
        assert!(!after.is_busy());
        assert_eq!(after.pledge_id, before.pledge_id);
        assert_eq!(after.pledge_hash, before.pledge_hash);
        assert_eq!(checkout.api.submit_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_submit_failure_clears_stored_pledge() {
        let me = me();
        let checkout = checkout(MockGateway::ok());
        checkout.api.submit_fails.set(true);
        let draft = draft(12000);
        let before = SubmissionState {
            pledge_id: Some("pl_old".into()),
            pledge_hash: Some("stale".into()),
            ..card_state()
        };
        let request = SubmitRequest {
            draft: &draft,
            me: Some(&me),
            external_errors: &[],
        };

        let (outcome, after) = attempt(&checkout, &before, &request).await;

        assert_eq!(outcome, SubmitOutcome::SubmitFailed("Total zu tief".into()));
        assert_eq!(after.submit_error.as_deref(), Some("Total zu tief"));
        assert_eq!(after.pledge_id, None);
        assert_eq!(after.pledge_hash, None);
        assert!(!after.is_busy());
        assert!(checkout.api.payments.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_previous_submit_error_forces_new_pledge() {
        let me = me();
        let checkout = checkout(MockGateway::ok());
        let draft = draft(12000);
        let before = SubmissionState {
            pledge_id: Some("pl_old".into()),
            pledge_hash: Some(draft.hash()),
            submit_error: Some("earlier".into()),
            ..card_state()
        };
        let request = SubmitRequest {
            draft: &draft,
            me: Some(&me),
            external_errors: &[],
        };

        let (_, after) = attempt(&checkout, &before, &request).await;
        assert_eq!(checkout.api.submit_calls.get(), 1);
        assert_eq!(after.submit_error, None);
    }

    #[tokio::test]
    async fn test_email_verification_halts_before_payment() {
        let checkout = checkout(MockGateway::ok());
        checkout.api.email_verify.set(true);
        let state = card_state();
        let draft = anonymous_draft(12000);
        let request = SubmitRequest {
            draft: &draft,
            me: None,
            external_errors: &[],
        };

        let (outcome, state) = attempt(&checkout, &state, &request).await;

        assert_eq!(outcome, SubmitOutcome::EmailVerify);
        assert!(state.email_verify);
        assert!(!state.is_busy());
        assert_eq!(state.pledge_id, None);
        assert!(checkout.gateway.requests.borrow().is_empty());
        assert!(checkout.api.payments.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_error_surfaces_provider_message() {
        let me = me();
        let checkout = checkout(MockGateway::ok());
        *checkout.gateway.result.borrow_mut() = Err(SourceError {
            message: "Your card's expiration year is invalid.".into(),
            error_type: Some("card_error".into()),
            param: Some("exp_year".into()),
        });
        let state = card_state();
        let draft = draft(12000);
        let request = SubmitRequest {
            draft: &draft,
            me: Some(&me),
            external_errors: &[],
        };

        let (outcome, state) = attempt(&checkout, &state, &request).await;

        assert_eq!(
            outcome,
            SubmitOutcome::Payment(PaymentOutcome::FieldError {
                param: Some("exp_year".into()),
                message: "Your card's expiration year is invalid.".into(),
            })
        );
        assert_eq!(
            state.payment_error.as_deref(),
            Some("Your card's expiration year is invalid.")
        );
        assert!(!state.is_busy());
        assert!(checkout.api.payments.borrow().is_empty());
        assert_eq!(state.pledge_id.as_deref(), Some("pl_1"));
    }

    #[tokio::test]
    async fn test_three_d_secure_fails_closed() {
        let me = me();
        let checkout = checkout(MockGateway::with_source(json!({
            "id": "src_3ds",
            "card": { "three_d_secure": "required" },
        })));
        let state = card_state();
        let draft = draft(12000);
        let request = SubmitRequest {
            draft: &draft,
            me: Some(&me),
            external_errors: &[],
        };

        let (outcome, state) = attempt(&checkout, &state, &request).await;

        assert_eq!(
            outcome,
            SubmitOutcome::Payment(PaymentOutcome::Unsupported(
                messages::THREE_D_SECURE_UNSUPPORTED.into()
            ))
        );
        assert_eq!(
            state.payment_error.as_deref(),
            Some(messages::THREE_D_SECURE_UNSUPPORTED)
        );
        assert!(checkout.api.payments.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_visitor_is_signed_in_after_payment() {
        let checkout = checkout(MockGateway::ok());
        let state = card_state();
        let draft = anonymous_draft(12000);
        let request = SubmitRequest {
            draft: &draft,
            me: None,
            external_errors: &[],
        };

        let (outcome, _) = attempt(&checkout, &state, &request).await;

        assert!(matches!(
            outcome,
            SubmitOutcome::Payment(PaymentOutcome::Completed { .. })
        ));
        assert_eq!(*checkout.api.sign_ins.borrow(), ["anna@example.ch"]);
        assert_eq!(checkout.navigator.pushes.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_sign_in_failure_does_not_undo_payment() {
        let checkout = checkout(MockGateway::ok());
        checkout.api.sign_in_fails.set(true);
        let state = card_state();
        let draft = anonymous_draft(12000);
        let request = SubmitRequest {
            draft: &draft,
            me: None,
            external_errors: &[],
        };

        let (outcome, state) = attempt(&checkout, &state, &request).await;

        assert_eq!(
            outcome,
            SubmitOutcome::SignInFailed {
                pledge_id: "pl_1".into(),
                message: "Anmeldung fehlgeschlagen".into(),
            }
        );
        assert_eq!(state.sign_in_error.as_deref(), Some("Anmeldung fehlgeschlagen"));
        assert_eq!(state.payment_error, None);
        assert_eq!(checkout.api.payments.borrow().len(), 1);
        assert!(checkout.navigator.pushes.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_visitor_without_email_is_not_signed_in() {
        let checkout = checkout(MockGateway::ok());
        let state = card_state();
        let without_user = draft(12000);
        let blank_email = PledgeDraft {
            user: Some(PledgeUser::default()),
            ..draft(12000)
        };

        for draft in [&without_user, &blank_email] {
            let request = SubmitRequest {
                draft,
                me: None,
                external_errors: &[],
            };
            let (outcome, _) = attempt(&checkout, &state, &request).await;
            assert!(matches!(
                outcome,
                SubmitOutcome::Payment(PaymentOutcome::Completed { .. })
            ));
        }

        assert!(checkout.api.sign_ins.borrow().is_empty());
        let pushes = checkout.navigator.pushes.borrow();
        assert_eq!(pushes.len(), 2);
        assert!(pushes.iter().all(|(_, query)| query.len() == 1 && query[0].0 == "id"));
    }

    #[tokio::test]
    async fn test_postfinance_redirect() {
        let me = me();
        let checkout = checkout(MockGateway::ok());
        let state = method_state(PaymentMethod::PostFinanceCard);
        let draft = draft(12000);
        let request = SubmitRequest {
            draft: &draft,
            me: Some(&me),
            external_errors: &[],
        };

        let (outcome, state) = attempt(&checkout, &state, &request).await;

        assert_eq!(outcome, SubmitOutcome::Payment(PaymentOutcome::Redirected));
        assert_eq!(state.loading.as_deref(), Some(messages::LOADING_POSTFINANCE));

        let posts = checkout.navigator.posts.borrow();
        let (action, params) = &posts[0];
        assert_eq!(action, &checkout.config().postfinance.form_action);
        let field = |key: &str| params.iter().find(|p| p.key == key).map(|p| p.value.as_str());
        assert_eq!(field("ORDERID"), Some("pl_1"));
        assert_eq!(field("ALIAS"), Some("u_1"));
        assert_eq!(field("AMOUNT"), Some("12000"));
        assert!(field("SHASIGN").is_some());
        assert!(checkout.api.payments.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_paypal_redirect_uses_stored_pledge() {
        let me = me();
        let checkout = checkout(MockGateway::ok());
        let draft = draft(12050);
        let state = SubmissionState {
            pledge_id: Some("pl_base".into()),
            pledge_hash: Some(draft.hash()),
            ..method_state(PaymentMethod::PayPal)
        };
        let request = SubmitRequest {
            draft: &draft,
            me: Some(&me),
            external_errors: &[],
        };

        let (outcome, _) = attempt(&checkout, &state, &request).await;

        assert_eq!(outcome, SubmitOutcome::Payment(PaymentOutcome::Redirected));
        assert_eq!(checkout.api.submit_calls.get(), 0);
        let posts = checkout.navigator.posts.borrow();
        let params = &posts[0].1;
        assert_eq!(params[2], Param::new("item_name", "pl_base"));
        assert_eq!(params[3], Param::new("amount", "120.50"));
    }

    #[tokio::test]
    async fn test_failed_redirect_reports_payment_error() {
        let me = me();
        let checkout = checkout(MockGateway::ok());
        checkout.navigator.fails.set(true);
        let state = method_state(PaymentMethod::PayPal);
        let draft = draft(12000);
        let request = SubmitRequest {
            draft: &draft,
            me: Some(&me),
            external_errors: &[],
        };

        let (outcome, state) = attempt(&checkout, &state, &request).await;

        assert_eq!(
            outcome,
            SubmitOutcome::Payment(PaymentOutcome::ProviderError(
                messages::REDIRECT_FAILED.into()
            ))
        );
        assert!(!state.is_busy());
        assert_eq!(state.pledge_id.as_deref(), Some("pl_1"));
    }

    #[test]
    fn test_payment_slip_is_not_selectable() {
        let state = method_state(PaymentMethod::PaymentSlip);
        assert_eq!(
            validate(&state, &[]),
            Err(vec![messages::CHOOSE_PAYMENT_METHOD.to_string()])
        );
    }
}
