//! A set of text fields bound to a [`FormState`].

use yew::prelude::*;

use crate::components::TextInput;
use crate::form::{FormState, CARD_CVC, CARD_MONTH, CARD_NUMBER, CARD_YEAR};
use crate::messages;

/// One rendered field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub label: &'static str,
    pub name: &'static str,
    /// Group digits in blocks of four while typing.
    pub card_mask: bool,
}

/// The card fields in display order.
pub fn card_fields() -> Vec<Field> {
    vec![
        Field {
            label: messages::CARD_NUMBER_LABEL,
            name: CARD_NUMBER,
            card_mask: true,
        },
        Field {
            label: messages::CARD_MONTH_LABEL,
            name: CARD_MONTH,
            card_mask: false,
        },
        Field {
            label: messages::CARD_YEAR_LABEL,
            name: CARD_YEAR,
            card_mask: false,
        },
        Field {
            label: messages::CARD_CVC_LABEL,
            name: CARD_CVC,
            card_mask: false,
        },
    ]
}

/// `4242424242424242` to `4242 4242 4242 4242`. Non-digits are dropped and
/// input stops after sixteen digits.
pub fn mask_card_number(value: &str) -> String {
    let digits: Vec<char> = value.chars().filter(char::is_ascii_digit).take(16).collect();
    digits
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Properties, PartialEq)]
pub struct FieldSetProps {
    pub fields: Vec<Field>,
    pub form: FormState,
    /// Emits `(name, value)` for every edit.
    pub on_change: Callback<(&'static str, String)>,
}

#[function_component(FieldSet)]
pub fn field_set(props: &FieldSetProps) -> Html {
    html! {
        <div class="ygc-field-set">
            { for props.fields.iter().map(|field| {
                let name = field.name;
                let card_mask = field.card_mask;
                let on_change = props.on_change.clone();
                let oninput = Callback::from(move |value: String| {
                    let value = if card_mask { mask_card_number(&value) } else { value };
                    on_change.emit((name, value));
                });
                html! {
                    <TextInput
                        key={name}
                        name={name}
                        label={field.label}
                        value={props.form.value(name).to_string()}
                        error={props.form.visible_error(name).map(|e| AttrValue::from(e.to_string()))}
                        {oninput}
                    />
                }
            }) }
        </div>
    }
}
