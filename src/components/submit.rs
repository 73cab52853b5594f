//! The pay step of the pledge form.
//!
//! Renders the payment method picker, the card fields, the banners and the
//! pay button from a [`SubmissionState`] held in `use_reducer`, and hands
//! clicks to [`Checkout::submit`].

use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::api::{GraphqlApi, PledgeApi};
use crate::checkout::{self, Checkout, SubmitRequest};
use crate::client::StripeClient;
use crate::components::field_set::{self, FieldSet};
use crate::components::Button;
use crate::config::CheckoutConfig;
use crate::interop::use_stripejs;
use crate::logging;
use crate::messages;
use crate::navigator::BrowserNavigator;
use crate::pledge::{Me, PaymentMethod, PledgeDraft, PledgeOption, PledgeUser};
use crate::state::{Action, SubmissionState};

pub type BrowserCheckout = Checkout<GraphqlApi, StripeClient, BrowserNavigator>;

/// Properties for [`SubmitPledge`].
///
/// The pledge content (`total`, `options`, `reason`, `user`) and `errors`
/// come from the surrounding pledge form.
#[derive(Properties, PartialEq)]
pub struct SubmitPledgeProps {
    pub config: Rc<CheckoutConfig>,
    /// Amount in Rappen.
    pub total: u32,
    pub options: Vec<PledgeOption>,
    #[prop_or_default]
    pub reason: Option<String>,
    /// Contact data of an anonymous visitor, once the form has it.
    #[prop_or_default]
    pub user: Option<PledgeUser>,
    /// The signed-in visitor, if any.
    #[prop_or_default]
    pub me: Option<Me>,
    /// Validation errors of the surrounding form.
    #[prop_or_default]
    pub errors: Vec<String>,
    /// Fired when a submit is refused because of validation errors.
    #[prop_or_default]
    pub on_error: Callback<()>,
    /// Pay an already existing pledge, e.g. after a cancelled redirect.
    #[prop_or_default]
    pub base_pledge_id: Option<String>,
}

#[function_component(SubmitPledge)]
pub fn submit_pledge(props: &SubmitPledgeProps) -> Html {
    {
        let level = props.config.log_level.clone();
        use_effect_with((), move |_| {
            logging::init(&level);
            || ()
        });
    }

    let stripe_ready = use_stripejs();
    let checkout = use_memo(props.config.clone(), |config| {
        BrowserCheckout::new(
            GraphqlApi::new(config.api_url.clone()),
            StripeClient::new(config.stripe.publishable_key.clone()),
            BrowserNavigator,
            (**config).clone(),
        )
    });

    let draft = PledgeDraft::new(
        props.total,
        props.options.clone(),
        props.reason.clone(),
        props.user.clone(),
        props.me.as_ref(),
    );

    let state = {
        let base_pledge_id = props.base_pledge_id.clone();
        let draft = draft.clone();
        let checkout = checkout.clone();
        use_reducer(move || {
            let state = match base_pledge_id {
                Some(id) => SubmissionState::with_base_pledge(id, &draft),
                None => SubmissionState::default(),
            };
            state.with_validators(Rc::new(checkout.gateway().clone()))
        })
    };
    let sign_in_phrase = use_state(|| None::<String>);

    {
        let dispatcher = state.dispatcher();
        use_effect_with(draft.hash(), move |hash| {
            dispatcher.dispatch(Action::DraftChanged { hash: hash.clone() });
            || ()
        });
    }

    let on_card_change = {
        let dispatcher = state.dispatcher();
        Callback::from(move |(name, value): (&'static str, String)| {
            dispatcher.dispatch(Action::CardFieldChanged {
                name: name.to_string(),
                value,
            });
        })
    };

    let on_pay = {
        let state = state.clone();
        let checkout = checkout.clone();
        let draft = draft.clone();
        let me = props.me.clone();
        let external_errors = props.errors.clone();
        let on_error = props.on_error.clone();
        Callback::from(move |_: MouseEvent| {
            let snapshot = (*state).clone();
            if checkout::validate(&snapshot, &external_errors).is_err() {
                on_error.emit(());
            }
            let dispatcher = state.dispatcher();
            let checkout = checkout.clone();
            let draft = draft.clone();
            let me = me.clone();
            let external_errors = external_errors.clone();
            spawn_local(async move {
                let request = SubmitRequest {
                    draft: &draft,
                    me: me.as_ref(),
                    external_errors: &external_errors,
                };
                let outcome = checkout
                    .submit(&snapshot, &request, |action| dispatcher.dispatch(action))
                    .await;
                tracing::debug!(?outcome, "checkout attempt finished");
            });
        })
    };

    let sign_in_email = draft
        .user
        .as_ref()
        .map(|user| user.email.clone())
        .filter(|email| !email.is_empty());

    let on_sign_in = {
        let checkout = checkout.clone();
        let dispatcher = state.dispatcher();
        let email = sign_in_email.clone();
        let sign_in_phrase = sign_in_phrase.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(email) = email.clone() else {
                return;
            };
            let checkout = checkout.clone();
            let dispatcher = dispatcher.clone();
            let sign_in_phrase = sign_in_phrase.clone();
            spawn_local(async move {
                match checkout.api().sign_in(&email).await {
                    Ok(response) => sign_in_phrase.set(Some(response.phrase)),
                    Err(e) => {
                        tracing::error!(error = %e, "signIn for email verification failed");
                        dispatcher.dispatch(Action::SignInFailed(e.display_message()));
                    }
                }
            });
        })
    };

    let errors = checkout::validate(&*state, &props.errors).err().unwrap_or_default();
    let card_selected = state.payment_method == Some(PaymentMethod::Stripe);

    html! {
        <div class="ygc-submit">
            <h2>{ messages::PAY_TITLE }</h2>
            <p class="ygc-payment-methods">
                { for PaymentMethod::ALL.iter().map(|&method| {
                    let dispatcher = state.dispatcher();
                    let onchange = Callback::from(move |_: Event| {
                        dispatcher.dispatch(Action::SelectPaymentMethod(method));
                    });
                    html! {
                        <span
                            key={method.key()}
                            class={classes!("ygc-payment-method", (!method.is_enabled()).then_some("ygc-payment-method--disabled"))}
                        >
                            <label>
                                <input
                                    type="radio"
                                    name="paymentMethod"
                                    value={method.key()}
                                    disabled={!method.is_enabled()}
                                    checked={state.payment_method == Some(method)}
                                    {onchange}
                                />
                                { " " }{ messages::payment_method_label(method) }
                            </label>
                            <br />
                        </span>
                    }
                }) }
            </p>

            if card_selected {
                <FieldSet
                    fields={field_set::card_fields()}
                    form={state.form.clone()}
                    on_change={on_card_change}
                />
            }

            if state.email_verify && props.me.is_none() {
                <div class="ygc-email-verify">
                    <p>{ messages::EMAIL_VERIFY_NOTE }</p>
                    if let Some(email) = sign_in_email.clone() {
                        if let Some(phrase) = (*sign_in_phrase).clone() {
                            <p>{ format!("{} {}", messages::SIGN_IN_HINT, email) }</p>
                            <p>{ messages::SIGN_IN_PHRASE }{ " " }<b>{ phrase }</b></p>
                        } else {
                            <Button label={messages::SIGN_IN_BUTTON} onclick={on_sign_in} />
                        }
                    }
                </div>
            }

            { for [&state.submit_error, &state.payment_error, &state.sign_in_error]
                .into_iter()
                .flatten()
                .map(|message| html! { <p class="ygc-error">{ message.clone() }</p> }) }

            if let Some(loading) = state.loading.clone() {
                <div class="ygc-loading">
                    <span class="ygc-spinner" />
                    <br />
                    { loading }
                </div>
            } else {
                <div>
                    if state.show_errors && !errors.is_empty() {
                        <div class="ygc-error">
                            { messages::ERROR_TITLE }
                            <ul>
                                { for errors.iter().map(|error| html! { <li>{ error.clone() }</li> }) }
                            </ul>
                        </div>
                    }
                    <Button
                        label={messages::PAY_BUTTON}
                        onclick={on_pay}
                        dimmed={!errors.is_empty()}
                        disabled={card_selected && !stripe_ready}
                    />
                </div>
            }
        </div>
    }
}
