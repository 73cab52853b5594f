//! Visitor-facing strings of the checkout (German, the site's language).

use crate::pledge::PaymentMethod;

pub const PAY_TITLE: &str = "Zahlungsart wählen";
pub const PAY_BUTTON: &str = "Bezahlen";
pub const ERROR_TITLE: &str = "Folgende Angaben fehlen noch:";
pub const CHOOSE_PAYMENT_METHOD: &str = "Zahlungsart auswählen";
pub const EMAIL_VERIFY_NOTE: &str =
    "Für diese E-Mail-Adresse besteht bereits ein Konto. Bitte melden Sie sich an, um fortzufahren.";
pub const THREE_D_SECURE_UNSUPPORTED: &str =
    "Karten, die 3D Secure verlangen, werden noch nicht unterstützt. Bitte verwenden Sie eine andere Karte oder Zahlungsart.";
pub const REDIRECT_FAILED: &str = "Die Weiterleitung zum Zahlungsanbieter ist fehlgeschlagen.";
pub const SIGN_IN_BUTTON: &str = "Anmeldelink senden";
pub const SIGN_IN_PHRASE: &str = "Prüfen Sie, ob die E-Mail diese Wörter enthält:";
pub const SIGN_IN_HINT: &str = "Wir haben Ihnen einen Anmeldelink geschickt an";

pub const LOADING_SUBMIT: &str = "Unterstützung wird gespeichert…";
pub const LOADING_STRIPE: &str = "Kreditkarte wird geprüft…";
pub const LOADING_PAY: &str = "Zahlung wird verarbeitet…";
pub const LOADING_POSTFINANCE: &str = "Weiterleitung zu PostFinance…";
pub const LOADING_PAYPAL: &str = "Weiterleitung zu PayPal…";

pub const CARD_NUMBER_LABEL: &str = "Kreditkarten-Nummer";
pub const CARD_NUMBER_EMPTY: &str = "Kreditkarten-Nummer fehlt";
pub const CARD_NUMBER_INVALID: &str = "Kreditkarten-Nummer ungültig";
pub const CARD_MONTH_LABEL: &str = "Monat";
pub const CARD_MONTH_EMPTY: &str = "Monat fehlt";
pub const CARD_MONTH_INVALID: &str = "Monat ungültig";
pub const CARD_YEAR_LABEL: &str = "Jahr";
pub const CARD_YEAR_EMPTY: &str = "Jahr fehlt";
pub const CARD_YEAR_INVALID: &str = "Jahr ungültig";
pub const CARD_CVC_LABEL: &str = "Prüfnummer (CVC)";
pub const CARD_CVC_EMPTY: &str = "Prüfnummer (CVC) fehlt";
pub const CARD_CVC_INVALID: &str = "Prüfnummer (CVC) ungültig";

/// Label of a payment method in the picker.
pub fn payment_method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::PaymentSlip => "Einzahlungsschein",
        PaymentMethod::Stripe => "Kreditkarte",
        PaymentMethod::PostFinanceCard => "PostFinance Card",
        PaymentMethod::PayPal => "PayPal",
    }
}
