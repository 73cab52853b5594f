pub mod api;
pub mod checkout;
pub mod config;
pub mod form;
pub mod gateway;
pub mod hash;
pub mod logging;
pub mod messages;
pub mod navigator;
pub mod pledge;
pub mod providers;
pub mod state;

mod bindings;
mod client;
mod interop;
mod components;

pub use api::{ApiError, GraphqlApi, PledgeApi};
pub use checkout::{Checkout, PaymentOutcome, PaymentRoute, SubmitOutcome, SubmitRequest};
pub use client::StripeClient;
pub use components::*;
pub use config::{CheckoutConfig, ConfigError};
pub use gateway::{CardGateway, CardValidator, Source, SourceError};
pub use interop::use_stripejs;
pub use navigator::{BrowserNavigator, Navigator};
pub use pledge::{Me, PaymentMethod, PledgeDraft, PledgeOption, PledgeUser};
pub use state::{Action, SubmissionState};
