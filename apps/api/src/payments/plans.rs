use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    ProMonthly,
    ProYearly,
}

/// Prices in minor units. JPY has no minor unit.
const PRO_MONTHLY_PRICES: &[(&str, i64)] = &[
    ("USD", 999),
    ("EUR", 899),
    ("GBP", 799),
    ("INR", 49_900),
    ("CAD", 1_299),
    ("AUD", 1_499),
    ("JPY", 1_500),
];

const PRO_YEARLY_PRICES: &[(&str, i64)] = &[
    ("USD", 7_999),
    ("EUR", 7_499),
    ("GBP", 6_499),
    ("INR", 399_900),
    ("CAD", 10_499),
    ("AUD", 11_999),
    ("JPY", 12_000),
];

const ZERO_DECIMAL_CURRENCIES: &[&str] = &["JPY", "KRW", "VND", "CLP"];

impl Plan {
    pub const PAID: [Plan; 2] = [Plan::ProMonthly, Plan::ProYearly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::ProMonthly => "pro_monthly",
            Plan::ProYearly => "pro_yearly",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::Free => "Free",
            Plan::ProMonthly => "Pro (monthly)",
            Plan::ProYearly => "Pro (yearly)",
        }
    }

    /// Price in minor units, or `None` if the plan is not sold in `currency`.
    pub fn price(&self, currency: &str) -> Option<i64> {
        let table = match self {
            Plan::Free => return Some(0),
            Plan::ProMonthly => PRO_MONTHLY_PRICES,
            Plan::ProYearly => PRO_YEARLY_PRICES,
        };
        table
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(currency))
            .map(|(_, amount)| *amount)
    }

    /// How long one successful payment extends access.
    pub fn period(&self) -> Option<Duration> {
        match self {
            Plan::Free => None,
            Plan::ProMonthly => Some(Duration::days(30)),
            Plan::ProYearly => Some(Duration::days(365)),
        }
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "pro_monthly" => Ok(Plan::ProMonthly),
            "pro_yearly" => Ok(Plan::ProYearly),
            other => Err(format!("unknown plan '{other}'")),
        }
    }
}

pub fn is_zero_decimal(currency: &str) -> bool {
    ZERO_DECIMAL_CURRENCIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(currency))
}

/// Minor units to the decimal string PayPal expects: 999 USD -> "9.99", 1500 JPY -> "1500".
pub fn format_major_units(amount: i64, currency: &str) -> String {
    if is_zero_decimal(currency) {
        return amount.to_string();
    }
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Inverse of [`format_major_units`]. Rejects more than two decimals.
pub fn parse_major_units(value: &str, currency: &str) -> Option<i64> {
    let value = value.trim();
    if is_zero_decimal(currency) {
        return value.parse().ok();
    }
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    if fraction.len() > 2 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: i64 = whole.parse().ok()?;
    let cents: i64 = format!("{fraction:0<2}").parse().ok()?;
    Some(whole * 100 + cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_prices() {
        assert_eq!(Plan::ProMonthly.price("USD"), Some(999));
        assert_eq!(Plan::ProYearly.price("inr"), Some(399_900));
        assert_eq!(Plan::ProMonthly.price("CHF"), None);
        assert_eq!(Plan::Free.price("USD"), Some(0));
    }

    #[test]
    fn test_every_paid_plan_is_priced_in_the_same_currencies() {
        for (currency, _) in PRO_MONTHLY_PRICES {
            assert!(Plan::ProYearly.price(currency).is_some(), "{currency}");
        }
    }

    #[rstest]
    #[case(999, "USD", "9.99")]
    #[case(49_900, "INR", "499.00")]
    #[case(5, "EUR", "0.05")]
    #[case(1_500, "JPY", "1500")]
    fn test_format_major_units(#[case] amount: i64, #[case] currency: &str, #[case] expected: &str) {
        assert_eq!(format_major_units(amount, currency), expected);
    }

    #[rstest]
    #[case("9.99", "USD", Some(999))]
    #[case("10", "USD", Some(1000))]
    #[case("10.5", "EUR", Some(1050))]
    #[case("1500", "JPY", Some(1500))]
    #[case("9.999", "USD", None)]
    #[case("abc", "USD", None)]
    fn test_parse_major_units(#[case] value: &str, #[case] currency: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_major_units(value, currency), expected);
    }

    #[test]
    fn test_plan_round_trips_through_str() {
        for plan in [Plan::Free, Plan::ProMonthly, Plan::ProYearly] {
            assert_eq!(plan.as_str().parse::<Plan>().unwrap(), plan);
        }
    }
}
