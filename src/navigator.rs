//! Leaving the checkout page.
//!
//! Redirect-based providers are paid by POSTing a form to their hosted
//! page, and a successful card payment moves on to the thank-you route.
//! Both are full navigations, abstracted behind [`Navigator`] so the
//! orchestrator can be driven without a DOM.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlFormElement, HtmlInputElement, UrlSearchParams};

use crate::providers::Param;

#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("no browser window")]
    NoWindow,
    #[error("dom error: {0}")]
    Dom(String),
}

impl From<JsValue> for NavigationError {
    fn from(value: JsValue) -> Self {
        NavigationError::Dom(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

pub trait Navigator {
    /// Submit a hidden POST form to `action`, leaving the page.
    fn post_form(&self, action: &str, params: &[Param]) -> Result<(), NavigationError>;

    /// Go to `path` with the given query.
    fn push(&self, path: &str, query: &[(&str, &str)]) -> Result<(), NavigationError>;
}

/// [`Navigator`] for the browser.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BrowserNavigator;

fn document() -> Result<Document, NavigationError> {
    web_sys::window()
        .and_then(|win| win.document())
        .ok_or(NavigationError::NoWindow)
}

impl Navigator for BrowserNavigator {
    fn post_form(&self, action: &str, params: &[Param]) -> Result<(), NavigationError> {
        let document = document()?;
        let form: HtmlFormElement = document
            .create_element("form")?
            .dyn_into()
            .map_err(JsValue::from)?;
        form.set_method("post");
        form.set_action(action);
        form.style().set_property("display", "none")?;

        for param in params {
            let input: HtmlInputElement = document
                .create_element("input")?
                .dyn_into()
                .map_err(JsValue::from)?;
            input.set_type("hidden");
            input.set_name(param.key);
            input.set_value(&param.value);
            form.append_child(&input)?;
        }

        document
            .body()
            .ok_or_else(|| NavigationError::Dom("document has no body".into()))?
            .append_child(&form)?;
        tracing::info!(action, fields = params.len(), "posting provider form");
        form.submit()?;
        Ok(())
    }

    fn push(&self, path: &str, query: &[(&str, &str)]) -> Result<(), NavigationError> {
        let search = UrlSearchParams::new()?;
        for (key, value) in query {
            search.append(key, value);
        }
        let search = String::from(search.to_string());
        let url = if search.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{search}")
        };
        web_sys::window()
            .ok_or(NavigationError::NoWindow)?
            .location()
            .assign(&url)?;
        Ok(())
    }
}
