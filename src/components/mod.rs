//! Yew components of the checkout.

use web_sys::HtmlInputElement;
use yew::prelude::*;

pub mod field_set;
pub mod menu;
pub mod submit;

pub use field_set::{Field, FieldSet};
pub use menu::{Menu, MenuItem};
pub use submit::{SubmitPledge, SubmitPledgeProps};

/// A simple, styled button.
#[derive(Properties, PartialEq)]
pub struct ButtonProps {
    /// Button label text
    pub label: AttrValue,
    /// Click handler
    pub onclick: Callback<MouseEvent>,
    /// Disable state
    #[prop_or_default]
    pub disabled: bool,
    /// Render dimmed while still clickable, e.g. while the form has errors.
    #[prop_or_default]
    pub dimmed: bool,
}

#[function_component(Button)]
pub fn button(props: &ButtonProps) -> Html {
    html! {
        <button
            type="button"
            onclick={props.onclick.clone()}
            disabled={props.disabled}
            class={classes!("ygc-button", props.dimmed.then_some("ygc-button--dimmed"))}
        >
            { &props.label }
        </button>
    }
}

/// A labelled, controlled text input with an optional error line.
#[derive(Properties, PartialEq)]
pub struct TextInputProps {
    pub name: AttrValue,
    pub label: AttrValue,
    /// Current value
    pub value: AttrValue,
    /// Emits new value on each keystroke
    pub oninput: Callback<String>,
    #[prop_or_default]
    pub error: Option<AttrValue>,
    /// Placeholder text
    #[prop_or_default]
    pub placeholder: AttrValue,
}

#[function_component(TextInput)]
pub fn text_input(props: &TextInputProps) -> Html {
    let oninput = props.oninput.clone();
    html! {
        <label class={classes!("ygc-field", props.error.is_some().then_some("ygc-field--error"))}>
            <span class="ygc-field-label">
                { props.error.clone().unwrap_or_else(|| props.label.clone()) }
            </span>
            <input
                type="text"
                class="ygc-text-input"
                name={props.name.clone()}
                value={props.value.clone()}
                placeholder={props.placeholder.clone()}
                oninput={Callback::from(move |e: InputEvent| {
                    let input: HtmlInputElement = e.target_unchecked_into();
                    oninput.emit(input.value());
                })}
            />
        </label>
    }
}
