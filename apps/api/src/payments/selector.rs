//! Payment Gateway Selector: billing country (and currency) to gateway.

use crate::payments::error::PaymentError;
use crate::payments::gateway::GatewayKind;

/// Countries where payments are refused outright.
const BLOCKED_COUNTRIES: &[&str] = &["CU", "IR", "KP", "SY", "RU", "BY"];

const STRIPE_COUNTRIES: &[&str] = &[
    "US", "CA", "GB", "IE", "FR", "DE", "ES", "IT", "NL", "BE", "AT", "PT", "FI", "LU", "GR",
    "SK", "SI", "EE", "LV", "LT", "MT", "CY", "SE", "DK", "NO", "CH", "PL", "CZ", "AU", "NZ",
    "JP", "SG", "HK", "MX", "BR", "AE",
];

const EUROZONE: &[&str] = &[
    "AT", "BE", "CY", "DE", "EE", "ES", "FI", "FR", "GR", "HR", "IE", "IT", "LT", "LU", "LV",
    "MT", "NL", "PT", "SI", "SK",
];

/// Validates and upper-cases an ISO 3166-1 alpha-2 code.
pub fn normalize_country(country: &str) -> Result<String, PaymentError> {
    let code = country.trim().to_ascii_uppercase();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(PaymentError::InvalidRequest(format!(
            "'{country}' is not a two-letter country code"
        )));
    }
    Ok(code)
}

/// Currency shown to a country when the client does not ask for one.
pub fn default_currency(country: &str) -> &'static str {
    let country = country.trim().to_ascii_uppercase();
    match country.as_str() {
        "IN" => "INR",
        "GB" => "GBP",
        "CA" => "CAD",
        "AU" => "AUD",
        "JP" => "JPY",
        c if EUROZONE.contains(&c) => "EUR",
        _ => "USD",
    }
}

/// `IN` goes to Razorpay, Stripe markets to Stripe, everyone else to PayPal.
/// Blocked countries and currencies the chosen gateway does not take are
/// user-facing `Unsupported` errors.
pub fn select_gateway(country: &str, currency: &str) -> Result<GatewayKind, PaymentError> {
    let country = normalize_country(country)?;
    let currency = currency.trim().to_ascii_uppercase();

    if BLOCKED_COUNTRIES.contains(&country.as_str()) {
        return Err(PaymentError::unsupported(format!(
            "payments are not available in {country}"
        )));
    }

    let kind = if country == "IN" {
        GatewayKind::Razorpay
    } else if STRIPE_COUNTRIES.contains(&country.as_str()) {
        GatewayKind::Stripe
    } else {
        GatewayKind::Paypal
    };

    if !kind.supported_currencies().contains(&currency.as_str()) {
        return Err(PaymentError::unsupported(format!(
            "{currency} is not accepted for payments from {country}"
        )));
    }
    Ok(kind)
}
